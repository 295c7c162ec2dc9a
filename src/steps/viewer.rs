//! Image viewer steps
//!
//! Every accessible name is passed through the catalog first so the same
//! scenarios run under any locale.

use std::time::Duration;

use crate::a11y::{Handle, Query};
use crate::common::{paths, Error, Result};

use super::context::Context;
use super::registry::{Args, Registry, StepDef};

/// Key of the About dialog handle
pub const ABOUT_DIALOG: &str = "about_dialog";

/// Separator in the size label, e.g. `800 × 600 pixels`
const SIZE_SEPARATOR: &str = " \u{00d7} ";

/// Index of the size value among the image information labels
const SIZE_VALUE_INDEX: i64 = 11;

const SETTLE_CONTEXT_MENU: Duration = Duration::from_millis(100);
const SETTLE_LAYOUT: Duration = Duration::from_millis(500);
const SETTLE_SECOND: Duration = Duration::from_secs(1);

pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(StepDef::action("Open About dialog", open_about_dialog))?;
    registry.register(StepDef::action(
        "Open and close About dialog",
        open_and_close_about_dialog,
    ))?;
    registry.register(StepDef::assertion(
        "Website link to wiki is displayed",
        website_link_is_displayed,
    ))?;
    registry.register(StepDef::assertion(
        "GPL 2.0 link is displayed",
        license_link_is_displayed,
    ))?;
    registry.register(StepDef::action(
        "Open \"{filename}\" via menu",
        open_file_via_menu,
    ))?;
    registry.register(StepDef::assertion(
        "image size is {width:d}x{height:d}",
        image_size_is,
    ))?;
    registry.register(StepDef::action(
        "Rotate the image clockwise",
        rotate_image_clockwise,
    ))?;
    registry.register(StepDef::action(
        "Click Fullscreen button on headerbar",
        click_fullscreen,
    ))?;
    registry.register(StepDef::action(
        "Open context menu for current image",
        open_context_menu,
    ))?;
    registry.register(StepDef::action(
        "Select \"{item}\" from context menu",
        select_from_context_menu,
    ))?;
    registry.register(
        StepDef::assertion("sidepanel is {state:w}", sidepanel_is)
            .choices("state", &["displayed", "hidden"]),
    )?;
    registry.register(StepDef::assertion(
        "application is displayed fullscreen",
        application_fullscreen,
    ))?;
    registry.register(
        StepDef::assertion(
            "application is {negative:w} fullscreen anymore",
            application_fullscreen,
        )
        .choices("negative", &["not"]),
    )?;
    registry.register(StepDef::action("Wait a second", wait_a_second))?;
    registry.register(StepDef::action(
        "Click \"Hide\" in wallpaper popup",
        hide_wallpaper_popup,
    ))?;
    registry.register(StepDef::assertion(
        "wallpaper is set to \"{filename}\"",
        wallpaper_is_set_to,
    ))?;
    registry.register(StepDef::assertion(
        "\"{filename}\" file exists",
        file_exists,
    ))?;
    registry.register(StepDef::assertion(
        "image type is \"{mimetype}\"",
        image_type_is,
    ))?;
    registry.register(StepDef::action("Select \"{menu}\" menu", select_menu))?;
    registry.register(StepDef::action(
        "Open and close hamburger menu",
        open_and_close_hamburger_menu,
    ))?;
    registry.register(StepDef::action("Select \"{name}\" window", select_window))?;
    Ok(())
}

/// Fail unless the node is showing
pub(crate) fn expect_showing(ctx: &mut Context<'_>, node: &Handle, message: &str) -> Result<()> {
    if ctx.showing(node)? {
        Ok(())
    } else {
        Err(Error::assertion(message, "showing", "not showing"))
    }
}

fn image_info_panel(ctx: &Context<'_>) -> Handle {
    ctx.current().child(Query::role("page tab list"))
}

fn drawing_area(ctx: &Context<'_>) -> Handle {
    ctx.current().child(Query::role("drawing area"))
}

fn open_about_dialog(ctx: &mut Context<'_>, _: &Args) -> Result<()> {
    ctx.execute_steps("* Click \"About\" in GApplication menu")?;

    let title = ctx.translate("About Eye of GNOME");
    let dialog = ctx.current().child(Query::role_name("dialog", title));
    ctx.inspect(&dialog)?;
    ctx.remember(ABOUT_DIALOG, dialog);
    Ok(())
}

fn open_and_close_about_dialog(ctx: &mut Context<'_>, _: &Args) -> Result<()> {
    ctx.execute_steps("* Click \"About\" in GApplication menu")?;
    ctx.key_combo("<Esc>")
}

/// The opened About dialog, or the active window when none was opened
fn about_window(ctx: &Context<'_>) -> Handle {
    ctx.recall(ABOUT_DIALOG)
        .unwrap_or_else(|_| ctx.current().clone())
}

fn website_link_is_displayed(ctx: &mut Context<'_>, _: &Args) -> Result<()> {
    let dialog = about_window(ctx);
    let link = dialog.named(&ctx.translate("Website"));
    expect_showing(ctx, &link, "Website link is not displayed")
}

fn license_link_is_displayed(ctx: &mut Context<'_>, _: &Args) -> Result<()> {
    let dialog = about_window(ctx);

    let checks = [
        ("Eye of GNOME", "App name is not displayed"),
        ("Image viewer for GNOME", "App description is not displayed"),
        ("Website", "Website link is not displayed"),
    ];
    for (label, message) in checks {
        let node = dialog.named(&ctx.translate(label));
        expect_showing(ctx, &node, message)?;
    }

    let about_tab = dialog.child(Query::role_name("radio button", ctx.translate("About")));
    if !ctx.inspect(&about_tab)?.checked {
        return Err(Error::assertion(
            "About tab is not selected",
            "checked",
            "unchecked",
        ));
    }

    let credits_tab = dialog.child(Query::role_name("radio button", ctx.translate("Credits")));
    if ctx.inspect(&credits_tab)?.checked {
        return Err(Error::assertion(
            "Credits tab is selected",
            "unchecked",
            "checked",
        ));
    }

    Ok(())
}

fn open_file_via_menu(ctx: &mut Context<'_>, args: &Args) -> Result<()> {
    let filename = args.str("filename")?;
    ctx.key_combo("<Ctrl>O")?;
    ctx.execute_steps(&format!(
        "* file select dialog with name \"Open Image\" is displayed\n\
         * In file select dialog select \"{filename}\""
    ))?;
    ctx.settle(SETTLE_LAYOUT);
    Ok(())
}

/// Parse the size label: `"<width> × <height>[ <unit>]"`
///
/// The separator is U+00D7 with a space on each side; an ASCII `x` does not
/// count.
pub fn parse_dimensions(text: &str) -> Result<(i64, i64)> {
    let parts: Vec<&str> = text.split(SIZE_SEPARATOR).collect();
    if parts.len() != 2 {
        return Err(Error::ParseError(format!(
            "expected '<width> × <height>', got '{text}'"
        )));
    }

    let width = parts[0].trim();
    let height = parts[1].split_whitespace().next().unwrap_or("");

    let number = |s: &str| {
        s.parse::<i64>()
            .map_err(|_| Error::ParseError(format!("'{s}' is not a number in '{text}'")))
    };
    Ok((number(width)?, number(height)?))
}

fn image_size_is(ctx: &mut Context<'_>, args: &Args) -> Result<()> {
    let width = args.int("width")?;
    let height = args.int("height")?;

    let size_label = ctx.translate("Size");
    let value = image_info_panel(ctx)
        .named(&size_label)
        .parent()
        .nth(SIZE_VALUE_INDEX);
    let text = ctx.poll_text(&value)?;

    let (actual_width, actual_height) = parse_dimensions(&text).map_err(|e| match e {
        Error::ParseError(detail) => {
            Error::ParseError(format!("Incorrect width/height is displayed: {detail}"))
        }
        other => other,
    })?;

    if actual_width != width {
        return Err(Error::assertion("Image width differs", width, actual_width));
    }
    if actual_height != height {
        return Err(Error::assertion(
            "Image height differs",
            height,
            actual_height,
        ));
    }
    Ok(())
}

fn rotate_image_clockwise(ctx: &mut Context<'_>, _: &Args) -> Result<()> {
    let description = ctx.translate("Rotate the image 90 degrees to the right");
    let button = ctx.current().child(Query::description(description));
    ctx.inspect(&button)?;

    let area = drawing_area(ctx);
    ctx.point(&area)?;
    ctx.settle(SETTLE_SECOND);
    ctx.click(&button)
}

fn click_fullscreen(ctx: &mut Context<'_>, _: &Args) -> Result<()> {
    let button = ctx.current().named(&ctx.translate("Fullscreen"));
    ctx.click(&button)
}

fn open_context_menu(ctx: &mut Context<'_>, _: &Args) -> Result<()> {
    let area = drawing_area(ctx);
    ctx.right_click(&area)?;
    ctx.settle(SETTLE_CONTEXT_MENU);
    Ok(())
}

fn select_from_context_menu(ctx: &mut Context<'_>, args: &Args) -> Result<()> {
    let area = drawing_area(ctx);
    ctx.right_click(&area)?;
    ctx.settle(SETTLE_CONTEXT_MENU);

    let label = ctx.translate(args.str("item")?);
    let item = ctx.current().child(Query::role("window")).menu_item(&label);
    ctx.click(&item)
}

fn sidepanel_is(ctx: &mut Context<'_>, args: &Args) -> Result<()> {
    let expected = args.word("state")? == "displayed";
    ctx.settle(SETTLE_LAYOUT);

    let panel = image_info_panel(ctx);
    let actual = ctx.showing(&panel)?;
    if actual != expected {
        let describe = |showing: bool| if showing { "displayed" } else { "hidden" };
        return Err(Error::assertion(
            "Sidepanel state differs",
            describe(expected),
            describe(actual),
        ));
    }
    Ok(())
}

fn application_fullscreen(ctx: &mut Context<'_>, args: &Args) -> Result<()> {
    let expect_fullscreen = args.opt_word("negative").is_none();
    ctx.settle(SETTLE_LAYOUT);

    let area = drawing_area(ctx);
    let (_, y) = ctx.inspect(&area)?.position;
    let fullscreen = y == 0;

    if fullscreen != expect_fullscreen {
        let message = if expect_fullscreen {
            "Application is not displayed fullscreen"
        } else {
            "Application is still fullscreen"
        };
        let expected = if expect_fullscreen {
            "image at y = 0"
        } else {
            "image below the headerbar"
        };
        return Err(Error::assertion(message, expected, format!("y = {y}")));
    }
    Ok(())
}

fn wait_a_second(ctx: &mut Context<'_>, _: &Args) -> Result<()> {
    ctx.settle(SETTLE_SECOND);
    Ok(())
}

fn hide_wallpaper_popup(ctx: &mut Context<'_>, _: &Args) -> Result<()> {
    let button = ctx.current().button(&ctx.translate("Hide"));
    ctx.click(&button)
}

/// File name from a settings value such as `'file:///home/u/Pictures/a.png'`
pub fn wallpaper_filename(raw: &str) -> &str {
    let value = raw.trim().trim_matches(|c| c == '\'' || c == '"');
    value.rsplit('/').next().unwrap_or(value)
}

fn wallpaper_is_set_to(ctx: &mut Context<'_>, args: &Args) -> Result<()> {
    let expected = args.str("filename")?;
    let raw = ctx.setting("org.gnome.desktop.background", "picture-uri")?;
    let actual = wallpaper_filename(&raw);

    if actual != expected {
        return Err(Error::assertion(
            "Wallpaper is set to a different file",
            expected,
            actual,
        ));
    }
    Ok(())
}

fn file_exists(_: &mut Context<'_>, args: &Args) -> Result<()> {
    let filename = args.str("filename")?;
    let path = paths::expand_home(filename);
    if !path.is_file() {
        return Err(Error::assertion(
            format!("File '{}' does not exist", path.display()),
            "a regular file",
            if path.exists() { "not a regular file" } else { "nothing" },
        ));
    }
    Ok(())
}

fn image_type_is(ctx: &mut Context<'_>, args: &Args) -> Result<()> {
    let expected = args.str("mimetype")?;
    let type_label = ctx.translate("Type:");
    let value = image_info_panel(ctx).named(&type_label).parent().nth(-1);
    let actual = ctx.text(&value)?;

    if actual != expected {
        return Err(Error::assertion("Image type differs", expected, actual));
    }
    Ok(())
}

fn select_menu(ctx: &mut Context<'_>, args: &Args) -> Result<()> {
    let labels: Vec<String> = args
        .str("menu")?
        .split(" -> ")
        .map(|segment| ctx.translate(segment.trim()))
        .collect();
    let app = ctx.current().clone();

    let Some((first, rest)) = labels.split_first() else {
        return Ok(());
    };
    let mut current = app.menu(first);
    ctx.click(&current)?;

    let Some((last, middle)) = rest.split_last() else {
        return Ok(());
    };
    for label in middle {
        current = app.menu(label);
        ctx.point(&current)?;
    }

    let item = current.menu_item(last);
    ctx.click(&item)
}

fn open_and_close_hamburger_menu(ctx: &mut Context<'_>, _: &Args) -> Result<()> {
    let button = ctx.current().named(&ctx.translate("Menu"));
    ctx.click(&button)?;
    ctx.key_combo("<Esc>")
}

fn select_window(ctx: &mut Context<'_>, args: &Args) -> Result<()> {
    let name = ctx.translate(args.str("name")?);
    ctx.narrow(Query::role_name("frame", name))
}
