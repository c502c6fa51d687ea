//! Paint command set and card scene composition.
//!
//! A scene is the renderable snapshot the rasterizer consumes: a flat,
//! ordered command list at 1× reference scale plus the asset sources the
//! commands refer to. Composition is pure; nothing here touches the
//! network or the filesystem.

use crate::assets::{AssetSlot, SceneAssets};
use crate::card::{format_display_date, CardView};
use crate::error::Result;
use crate::qr::{self, QrMatrix};
use crate::rendering::layout::{back_layout, front_layout, sheet_layout, Rect};
use crate::ExportConfig;

pub type Rgb = [u8; 3];

pub const WHITE: Rgb = [255, 255, 255];
pub const BLACK: Rgb = [20, 20, 20];
/// Face background ("card orange").
pub const CARD_ORANGE: Rgb = [240, 144, 48];
const DIVIDER: Rgb = [96, 72, 36];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// One drawing operation, in scene pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    FillRect {
        rect: Rect,
        color: Rgb,
    },
    StrokeRect {
        rect: Rect,
        color: Rgb,
        width: u32,
    },
    Text {
        rect: Rect,
        text: String,
        size: f32,
        weight: FontWeight,
        align: TextAlign,
        color: Rgb,
    },
    /// An asset window; the slot resolves through the scene's assets.
    Image {
        rect: Rect,
        slot: AssetSlot,
    },
    /// QR module grid filling `rect`.
    QrModules {
        rect: Rect,
        matrix: QrMatrix,
    },
}

/// A composed, self-contained renderable card snapshot.
#[derive(Debug, Clone)]
pub struct CardScene {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<PaintCommand>,
    pub assets: SceneAssets,
}

fn text(rect: Rect, text: impl Into<String>, size: f32, weight: FontWeight, align: TextAlign) -> PaintCommand {
    PaintCommand::Text {
        rect,
        text: text.into(),
        size,
        weight,
        align,
        color: BLACK,
    }
}

/// Split a rect into `n` equal horizontal bands.
fn bands(rect: Rect, n: u32) -> Vec<Rect> {
    let h = rect.height / n.max(1);
    (0..n)
        .map(|i| Rect::new(rect.x, rect.y + (i * h) as i32, rect.width, h))
        .collect()
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

// The side strip renders its caption upright, one character per step,
// mirroring vertical writing mode.
fn push_strip(commands: &mut Vec<PaintCommand>, strip: Rect) {
    commands.push(PaintCommand::FillRect { rect: strip, color: CARD_ORANGE });
    let divider = Rect::new(strip.x + strip.width as i32 - 1, strip.y, 1, strip.height);
    commands.push(PaintCommand::FillRect { rect: divider, color: DIVIDER });

    let caption = "ON CONTRACT";
    let step = 20;
    let total = caption.chars().count() as i32 * step;
    let mut y = strip.y + (strip.height as i32 - total) / 2;
    for ch in caption.chars() {
        if ch != ' ' {
            let cell = Rect::new(strip.x, y, strip.width, step as u32);
            commands.push(text(cell, ch, 13.0, FontWeight::Bold, TextAlign::Center));
        }
        y += step;
    }
}

fn push_face_frame(commands: &mut Vec<PaintCommand>, face: Rect) {
    commands.push(PaintCommand::FillRect { rect: face, color: CARD_ORANGE });
    commands.push(PaintCommand::StrokeRect { rect: face, color: BLACK, width: 2 });
}

fn push_front(commands: &mut Vec<PaintCommand>, view: &CardView, origin: (i32, i32)) {
    let l = front_layout();
    let at = |r: Rect| r.translated(origin.0, origin.1);
    let record = view.record;

    push_face_frame(commands, at(l.face));
    push_strip(commands, at(l.strip));

    commands.push(text(at(l.title), "Entry Pass", 14.0, FontWeight::Bold, TextAlign::Center));
    commands.push(text(
        at(l.company),
        or_placeholder(&record.profile_name, "Company Name"),
        10.0,
        FontWeight::Bold,
        TextAlign::Center,
    ));
    commands.push(text(
        at(l.card_no),
        format!("ID CARD No. {}", or_placeholder(&record.card_no, "ID")),
        10.0,
        FontWeight::Bold,
        TextAlign::Center,
    ));

    commands.push(PaintCommand::FillRect { rect: at(l.photo), color: WHITE });
    commands.push(PaintCommand::StrokeRect { rect: at(l.photo), color: BLACK, width: 2 });
    commands.push(PaintCommand::Image { rect: at(l.photo).inset(2), slot: AssetSlot::Photo });

    // Blank box for the handwritten name/designation.
    commands.push(PaintCommand::FillRect { rect: at(l.name_box), color: WHITE });
    commands.push(PaintCommand::StrokeRect { rect: at(l.name_box), color: BLACK, width: 1 });

    commands.push(text(
        at(l.name_line),
        or_placeholder(&record.employee_name, "EMPLOYEE NAME").to_uppercase(),
        10.0,
        FontWeight::Bold,
        TextAlign::Center,
    ));

    let authority = bands(at(l.authority), 2);
    commands.push(text(authority[0], record.hirer.clone(), 8.0, FontWeight::Bold, TextAlign::Right));
    commands.push(text(
        authority[1],
        "Designation of Issuing Authority",
        8.0,
        FontWeight::Bold,
        TextAlign::Right,
    ));
}

fn push_back(commands: &mut Vec<PaintCommand>, view: &CardView, origin: (i32, i32), matrix: QrMatrix) {
    let l = back_layout();
    let at = |r: Rect| r.translated(origin.0, origin.1);
    let record = view.record;

    push_face_frame(commands, at(l.face));
    push_strip(commands, at(l.strip));

    commands.push(PaintCommand::FillRect { rect: at(l.qr_window), color: WHITE });
    commands.push(PaintCommand::StrokeRect { rect: at(l.qr_window), color: BLACK, width: 1 });
    commands.push(PaintCommand::QrModules { rect: at(l.qr_window).inset(3), matrix });

    commands.push(PaintCommand::FillRect { rect: at(l.blood_window), color: WHITE });
    commands.push(PaintCommand::StrokeRect { rect: at(l.blood_window), color: BLACK, width: 1 });
    commands.push(text(
        at(l.blood_window),
        or_placeholder(&record.blood_group, "B+"),
        30.0,
        FontWeight::Bold,
        TextAlign::Center,
    ));

    let banner = if record.division_name.trim().is_empty() {
        or_placeholder(&record.designation, "Division")
    } else {
        record.division_name.clone()
    };
    commands.push(PaintCommand::FillRect { rect: at(l.division_banner), color: WHITE });
    commands.push(PaintCommand::StrokeRect { rect: at(l.division_banner), color: BLACK, width: 1 });
    commands.push(text(at(l.division_banner), banner, 16.0, FontWeight::Bold, TextAlign::Center));

    commands.push(text(
        at(l.mobile_line),
        or_placeholder(&record.mobile_number, "9999999999"),
        18.0,
        FontWeight::Bold,
        TextAlign::Center,
    ));
    commands.push(text(
        at(l.company_line),
        or_placeholder(&record.profile_name, "Company Name"),
        9.0,
        FontWeight::Bold,
        TextAlign::Left,
    ));

    let contract = bands(at(l.contract_block), 2);
    commands.push(text(contract[0], "Validity of Contract:", 8.0, FontWeight::Bold, TextAlign::Left));
    commands.push(text(
        contract[1],
        format!(
            "From {} To {}",
            format_display_date(record.contract_validity_date),
            format_display_date(record.contract_expiry_date)
        ),
        8.0,
        FontWeight::Regular,
        TextAlign::Left,
    ));

    let issue = bands(at(l.issue_block), 2);
    commands.push(text(
        issue[0],
        format!("Date of Issue {}", format_display_date(record.date_of_issue)),
        8.0,
        FontWeight::Bold,
        TextAlign::Left,
    ));
    commands.push(text(
        issue[1],
        "Validity: 01 year from the date of issue",
        8.0,
        FontWeight::Regular,
        TextAlign::Left,
    ));

    let instruction = at(l.instruction_block);
    let rule = Rect::new(instruction.x, instruction.y - 2, instruction.width, 1);
    commands.push(PaintCommand::FillRect { rect: rule, color: BLACK });
    let lines = bands(instruction, 3);
    commands.push(text(lines[0], "Instruction", 7.0, FontWeight::Bold, TextAlign::Center));
    commands.push(text(
        lines[1],
        "Please surrender to issuing authority on",
        7.0,
        FontWeight::Regular,
        TextAlign::Center,
    ));
    commands.push(text(
        lines[2],
        "completion of contractual services",
        7.0,
        FontWeight::Regular,
        TextAlign::Center,
    ));
}

/// Compose the export sheet: front and back faces stacked on white.
pub fn compose_sheet(view: &CardView, config: &ExportConfig) -> Result<CardScene> {
    let sheet = sheet_layout();
    let payload = qr::payload(config.qr_strategy, &config.verify_base_url, view);
    let matrix = qr::encode(&payload)?;

    let mut commands = Vec::new();
    commands.push(PaintCommand::FillRect {
        rect: Rect::new(0, 0, sheet.width, sheet.height),
        color: WHITE,
    });
    push_front(&mut commands, view, sheet.front_origin);
    push_back(&mut commands, view, sheet.back_origin, matrix);

    Ok(CardScene {
        width: sheet.width,
        height: sheet.height,
        commands,
        assets: SceneAssets {
            photo: view.photo.clone(),
            sign: view.sign.clone(),
            seal: view.seal.clone(),
        },
    })
}
