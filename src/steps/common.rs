//! Steps shared by GNOME application scenarios

use std::time::Duration;

use crate::a11y::Query;
use crate::common::{paths, Result};

use super::context::Context;
use super::registry::{Args, Registry, StepDef};
use super::viewer::expect_showing;

/// Key of the file chooser handle
pub const FILE_DIALOG: &str = "file_dialog";

const SETTLE_MENU: Duration = Duration::from_millis(500);

pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(StepDef::action(
        "Click \"{name}\" in GApplication menu",
        click_application_menu,
    ))?;
    registry.register(StepDef::assertion(
        "file select dialog with name \"{name}\" is displayed",
        file_dialog_is_displayed,
    ))?;
    registry.register(StepDef::action(
        "In file select dialog select \"{filename}\"",
        select_in_file_dialog,
    ))?;
    registry.register(StepDef::action("Press \"{combo}\"", press))?;
    Ok(())
}

fn click_application_menu(ctx: &mut Context<'_>, args: &Args) -> Result<()> {
    let button = ctx.current().named(&ctx.translate("Menu"));
    ctx.click(&button)?;
    ctx.settle(SETTLE_MENU);

    let item = ctx.current().menu_item(&ctx.translate(args.str("name")?));
    ctx.click(&item)
}

fn file_dialog_is_displayed(ctx: &mut Context<'_>, args: &Args) -> Result<()> {
    let name = ctx.translate(args.str("name")?);
    let dialog = ctx
        .current()
        .child(Query::role_name("file chooser", name.as_str()));
    expect_showing(ctx, &dialog, &format!("File dialog '{name}' is not displayed"))?;
    ctx.remember(FILE_DIALOG, dialog);
    Ok(())
}

fn select_in_file_dialog(ctx: &mut Context<'_>, args: &Args) -> Result<()> {
    let dialog = ctx.recall(FILE_DIALOG)?;
    let path = paths::expand_home(args.str("filename")?);

    ctx.focus(&dialog)?;
    ctx.key_combo("<Ctrl>L")?;
    ctx.type_text(&path.to_string_lossy())?;
    ctx.key_combo("<Enter>")
}

fn press(ctx: &mut Context<'_>, args: &Args) -> Result<()> {
    ctx.key_combo(args.str("combo")?)
}
