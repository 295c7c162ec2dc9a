//! Mock accessibility bridge for integration testing
//!
//! Serves a scripted application tree, loaded from a YAML fixture, over the
//! bridge protocol on stdio. Usage: `mock-bridge <fixture.yaml>`

use std::io::{BufReader, Write};
use std::path::PathBuf;

use serde_json::Value;

use a11y_steps::a11y::memory::Fixture;
use a11y_steps::a11y::{Driver, MemoryDriver};
use a11y_steps::bridge::codec;
use a11y_steps::bridge::protocol::{Command, Request, Response};
use a11y_steps::common::error::BridgeError;
use a11y_steps::{Error, Result};

fn main() {
    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: mock-bridge <fixture.yaml>");
        std::process::exit(2);
    };

    let driver = match load(&path) {
        Ok(driver) => driver,
        Err(e) => {
            eprintln!("mock-bridge: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut reader = BufReader::new(stdin.lock());
    let mut writer = stdout.lock();

    if let Err(e) = serve(driver, &mut reader, &mut writer) {
        eprintln!("mock-bridge: {}", e);
        std::process::exit(1);
    }
}

fn load(path: &std::path::Path) -> Result<MemoryDriver> {
    let text = Error::read_file(path)?;
    Ok(MemoryDriver::from_fixture(Fixture::from_yaml(&text)?))
}

/// Answer requests until the client hangs up
fn serve<R: std::io::BufRead, W: Write>(
    mut driver: MemoryDriver,
    reader: &mut R,
    writer: &mut W,
) -> Result<()> {
    loop {
        let message = match codec::read_message(reader) {
            Ok(message) => message,
            Err(Error::BridgeCrashed) => return Ok(()),
            Err(e) => return Err(e),
        };

        let response = match serde_json::from_str::<Request>(&message) {
            Ok(request) => match handle(&mut driver, request.command) {
                Ok(result) => Response::success(request.id, result),
                Err(e) => Response::error(request.id, BridgeError::from(&e)),
            },
            Err(e) => Response::error(
                0,
                BridgeError {
                    code: "PARSE_ERROR".to_string(),
                    message: e.to_string(),
                },
            ),
        };

        codec::write_message(writer, &serde_json::to_string(&response)?)?;
    }
}

fn handle(driver: &mut MemoryDriver, command: Command) -> Result<Value> {
    match command {
        Command::Inspect { path } => Ok(serde_json::to_value(driver.inspect(&path)?)?),
        Command::Click { path, button } => done(driver.click(&path, button)),
        Command::Point { path } => done(driver.point(&path)),
        Command::GrabFocus { path } => done(driver.grab_focus(&path)),
        Command::KeyCombo { combo } => done(driver.key_combo(&combo)),
        Command::TypeText { text } => done(driver.type_text(&text)),
        Command::Launch { app } => done(driver.launch(&app)),
        Command::Terminate { app } => done(driver.terminate(&app)),
    }
}

fn done(result: Result<()>) -> Result<Value> {
    result.map(|()| serde_json::json!({}))
}
