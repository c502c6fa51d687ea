//! Card geometry: physical dimensions and face layout boxes.
//!
//! The card's physical size is a design constant, not something measured
//! back out of a rendered scene. Scenes are laid out in CSS reference
//! pixels (96 per inch) so that one face styled at 54mm × 87mm occupies the
//! same box the browser layout did; the rasterizer scales from there.

/// Physical size of one printable region, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalLayout {
    pub width_mm: f32,
    pub height_mm: f32,
}

/// One card face: 54mm × 87mm, portrait.
pub const CARD_FACE: PhysicalLayout = PhysicalLayout {
    width_mm: 54.0,
    height_mm: 87.0,
};

/// CSS reference pixels per millimetre (96 dpi).
pub const CSS_PX_PER_MM: f32 = 96.0 / 25.4;

/// Convert millimetres to whole reference pixels.
pub fn mm_to_px(mm: f32) -> u32 {
    (mm * CSS_PX_PER_MM).round() as u32
}

impl PhysicalLayout {
    pub fn px_width(&self) -> u32 {
        mm_to_px(self.width_mm)
    }

    pub fn px_height(&self) -> u32 {
        mm_to_px(self.height_mm)
    }

    pub fn is_portrait(&self) -> bool {
        self.height_mm >= self.width_mm
    }
}

/// Axis-aligned box in scene pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Rect {
        Rect { x, y, width, height }
    }

    /// Shrink the box by `d` on every side (saturating).
    pub fn inset(&self, d: u32) -> Rect {
        Rect {
            x: self.x + d as i32,
            y: self.y + d as i32,
            width: self.width.saturating_sub(d * 2),
            height: self.height.saturating_sub(d * 2),
        }
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Vertical gap between the two faces on the export sheet.
pub const FACE_GAP_PX: u32 = 8;

/// Width of the vertical "ON CONTRACT" strip.
pub const STRIP_WIDTH_PX: u32 = 32;

const CONTENT_PAD_PX: i32 = 8;

/// Geometry of the front face, in face-local pixels.
#[derive(Debug, Clone, Copy)]
pub struct FrontLayout {
    pub face: Rect,
    pub strip: Rect,
    pub title: Rect,
    pub company: Rect,
    pub card_no: Rect,
    pub photo: Rect,
    pub name_box: Rect,
    pub name_line: Rect,
    pub authority: Rect,
}

/// Geometry of the back face, in face-local pixels.
#[derive(Debug, Clone, Copy)]
pub struct BackLayout {
    pub face: Rect,
    pub strip: Rect,
    pub qr_window: Rect,
    pub blood_window: Rect,
    pub division_banner: Rect,
    pub mobile_line: Rect,
    pub company_line: Rect,
    pub contract_block: Rect,
    pub issue_block: Rect,
    pub instruction_block: Rect,
}

/// The export sheet: both faces stacked on white.
#[derive(Debug, Clone, Copy)]
pub struct SheetLayout {
    pub width: u32,
    pub height: u32,
    pub front_origin: (i32, i32),
    pub back_origin: (i32, i32),
}

pub fn front_layout() -> FrontLayout {
    let w = CARD_FACE.px_width();
    let h = CARD_FACE.px_height();
    let face = Rect::new(0, 0, w, h);
    let content_x = STRIP_WIDTH_PX as i32 + CONTENT_PAD_PX;
    let content_w = w - STRIP_WIDTH_PX - 2 * CONTENT_PAD_PX as u32;
    // The photo window is a fixed 150px square centred in the content area.
    let photo_side = 150u32;
    let photo_x = STRIP_WIDTH_PX as i32 + (w - STRIP_WIDTH_PX - photo_side) as i32 / 2;
    FrontLayout {
        face,
        strip: Rect::new(0, 0, STRIP_WIDTH_PX, h),
        title: Rect::new(content_x, 8, content_w, 18),
        company: Rect::new(content_x, 28, content_w, 13),
        card_no: Rect::new(content_x, 42, content_w, 13),
        photo: Rect::new(photo_x, 60, photo_side, photo_side),
        name_box: Rect::new(photo_x, 216, photo_side, 22),
        name_line: Rect::new(content_x, 244, content_w, 13),
        authority: Rect::new(content_x + content_w as i32 - 110, h as i32 - 32, 110, 24),
    }
}

pub fn back_layout() -> BackLayout {
    let w = CARD_FACE.px_width();
    let h = CARD_FACE.px_height();
    let face = Rect::new(0, 0, w, h);
    let content_x = STRIP_WIDTH_PX as i32 + 4;
    let content_w = w - STRIP_WIDTH_PX - 8;
    // QR and blood-group windows are 20mm squares side by side.
    let window = mm_to_px(20.0);
    BackLayout {
        face,
        strip: Rect::new(0, 0, STRIP_WIDTH_PX, h),
        qr_window: Rect::new(content_x, 10, window, window),
        blood_window: Rect::new(content_x + content_w as i32 - window as i32, 10, window, window),
        division_banner: Rect::new(content_x, 96, content_w, 28),
        mobile_line: Rect::new(content_x, 130, content_w, 22),
        company_line: Rect::new(content_x, 156, content_w, 13),
        contract_block: Rect::new(content_x, 172, content_w, 26),
        issue_block: Rect::new(content_x, 202, content_w, 26),
        instruction_block: Rect::new(content_x, h as i32 - 36, content_w, 32),
    }
}

pub fn sheet_layout() -> SheetLayout {
    let w = CARD_FACE.px_width();
    let h = CARD_FACE.px_height();
    SheetLayout {
        width: w,
        height: h * 2 + FACE_GAP_PX,
        front_origin: (0, 0),
        back_origin: (0, (h + FACE_GAP_PX) as i32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_constant_is_a_portrait_face() {
        assert_eq!(CARD_FACE.width_mm, 54.0);
        assert_eq!(CARD_FACE.height_mm, 87.0);
        assert!(CARD_FACE.is_portrait());
    }

    #[test]
    fn reference_pixels_follow_css_96dpi() {
        assert_eq!(mm_to_px(25.4), 96);
        assert_eq!(CARD_FACE.px_width(), 204);
        assert_eq!(CARD_FACE.px_height(), 329);
    }

    #[test]
    fn sheet_stacks_two_faces_with_a_gap() {
        let sheet = sheet_layout();
        assert_eq!(sheet.width, CARD_FACE.px_width());
        assert_eq!(sheet.height, CARD_FACE.px_height() * 2 + FACE_GAP_PX);
        assert_eq!(sheet.front_origin, (0, 0));
        assert_eq!(sheet.back_origin.1, (CARD_FACE.px_height() + FACE_GAP_PX) as i32);
    }

    #[test]
    fn face_boxes_stay_inside_the_face() {
        let front = front_layout();
        for rect in [
            front.strip,
            front.title,
            front.photo,
            front.name_box,
            front.name_line,
            front.authority,
        ] {
            assert!(rect.x >= 0 && rect.y >= 0);
            assert!(rect.x as u32 + rect.width <= front.face.width);
            assert!(rect.y as u32 + rect.height <= front.face.height);
        }
        let back = back_layout();
        for rect in [
            back.strip,
            back.qr_window,
            back.blood_window,
            back.division_banner,
            back.mobile_line,
            back.contract_block,
            back.issue_block,
            back.instruction_block,
        ] {
            assert!(rect.x >= 0 && rect.y >= 0);
            assert!(rect.x as u32 + rect.width <= back.face.width);
            assert!(rect.y as u32 + rect.height <= back.face.height);
        }
        // The two 20mm windows must not overlap.
        assert!(back.qr_window.x as u32 + back.qr_window.width <= back.blood_window.x as u32);
    }

    #[test]
    fn rect_inset_saturates() {
        let r = Rect::new(10, 10, 8, 8);
        assert_eq!(r.inset(2), Rect::new(12, 12, 4, 4));
        assert_eq!(r.inset(10).width, 0);
    }
}
