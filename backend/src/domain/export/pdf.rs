//! PDF rendering of vouchers.
//!
//! [`PdfEngine`] is the seam to whatever turns vouchers into a PDF file. The
//! built-in [`PrintPdfEngine`] draws every voucher on its own A4 page with
//! the same layout as the HTML preview. Signatures given as base64 image data
//! URLs are drawn above each signatory line; anything else is left out.

use std::io::BufWriter;

use base64::{engine::general_purpose, Engine as _};
use printpdf::image_crate::{self, DynamicImage, GenericImageView};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference,
    Point,
};
use shared::Voucher;
use tracing::{debug, warn};

use super::layout;
use crate::error::{StoreError, StoreResult};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const LEFT: f32 = 15.0;
const RIGHT: f32 = 195.0;
/// Rows below this line would collide with the signatory blocks
const ITEMS_FLOOR: f32 = 75.0;
/// Signature images are fitted into this box above the signatory line
const SIGNATURE_HEIGHT: f32 = 15.0;
const SIGNATURE_DPI: f32 = 300.0;

/// A rendered document, the number of pages it holds and the signature images drawn
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub signatures: usize,
}

pub trait PdfEngine: Send + Sync {
    /// Render `vouchers` in order, one page each
    fn render(&self, vouchers: &[Voucher]) -> StoreResult<RenderedPdf>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PrintPdfEngine;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl PdfEngine for PrintPdfEngine {
    fn render(&self, vouchers: &[Voucher]) -> StoreResult<RenderedPdf> {
        if vouchers.is_empty() {
            return Err(StoreError::InvalidRequest("No vouchers to export".to_string()));
        }

        let (doc, first_page, first_layer) =
            PdfDocument::new("Payment Voucher", Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");

        let fonts = Fonts {
            regular: doc
                .add_builtin_font(BuiltinFont::Helvetica)
                .map_err(|e| StoreError::Export(e.to_string()))?,
            bold: doc
                .add_builtin_font(BuiltinFont::HelveticaBold)
                .map_err(|e| StoreError::Export(e.to_string()))?,
        };

        let mut pages = 0;
        let mut signatures = 0;
        for (index, voucher) in vouchers.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
                doc.get_page(page).get_layer(layer)
            };
            signatures += draw_voucher(&layer, &fonts, voucher);
            pages += 1;
        }

        let mut writer = BufWriter::new(Vec::<u8>::new());
        doc.save(&mut writer).map_err(|e| StoreError::Export(e.to_string()))?;
        let bytes = writer.into_inner().map_err(|e| StoreError::Export(e.to_string()))?;

        debug!(
            "Rendered {} voucher pages with {} signatures ({} bytes)",
            pages,
            signatures,
            bytes.len()
        );
        Ok(RenderedPdf { bytes, pages, signatures })
    }
}

fn text(layer: &PdfLayerReference, font: &IndirectFontRef, value: &str, size: f32, x: f32, y: f32) {
    layer.use_text(value, size, Mm(x), Mm(y), font);
}

fn rule(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32) {
    layer.add_line(Line {
        points: vec![(Point::new(Mm(x1), Mm(y1)), false), (Point::new(Mm(x2), Mm(y2)), false)],
        is_closed: false,
    });
}

fn frame(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y1)), false),
            (Point::new(Mm(x2), Mm(y1)), false),
            (Point::new(Mm(x2), Mm(y2)), false),
            (Point::new(Mm(x1), Mm(y2)), false),
        ],
        is_closed: true,
    });
}

/// Rough right alignment for Helvetica digits
fn right_aligned_x(value: &str, size: f32, right: f32) -> f32 {
    right - value.chars().count() as f32 * size * 0.19
}

/// Decode a `data:image/...;base64,` URL into an image
fn decode_signature(value: &str) -> Result<DynamicImage, String> {
    let (header, data) = value
        .strip_prefix("data:image/")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| "not an image data URL".to_string())?;
    if !header.ends_with(";base64") {
        return Err(format!("unsupported encoding in {:?}", header));
    }

    let bytes = general_purpose::STANDARD.decode(data.trim()).map_err(|e| e.to_string())?;
    image_crate::load_from_memory(&bytes).map_err(|e| e.to_string())
}

/// Draw `image` scaled to fit `width` x [`SIGNATURE_HEIGHT`], centred over `x..x + width`
fn signature(layer: &PdfLayerReference, image: &DynamicImage, x: f32, y: f32, width: f32) {
    let (pixels_wide, pixels_high) = image.dimensions();
    let natural_width = pixels_wide.max(1) as f32 / SIGNATURE_DPI * 25.4;
    let natural_height = pixels_high.max(1) as f32 / SIGNATURE_DPI * 25.4;
    let scale = (width / natural_width).min(SIGNATURE_HEIGHT / natural_height);

    Image::from_dynamic_image(image).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x + (width - natural_width * scale) / 2.0)),
            translate_y: Some(Mm(y)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(SIGNATURE_DPI),
            ..Default::default()
        },
    );
}

/// Returns the number of signature images drawn
fn draw_voucher(layer: &PdfLayerReference, fonts: &Fonts, voucher: &Voucher) -> usize {
    let company = voucher.company;

    frame(layer, 10.0, 10.0, 200.0, 287.0);

    let reference = layout::pv_reference(voucher);
    text(layer, &fonts.regular, &reference, 9.0, right_aligned_x(&reference, 9.0, RIGHT), 280.0);

    // Header
    text(layer, &fonts.bold, &layout::title(voucher), 11.0, 82.0, 270.0);
    text(layer, &fonts.bold, company.legal_name(), 13.0, 55.0, 261.0);
    text(layer, &fonts.regular, company.registration(), 9.0, 93.0, 255.0);
    rule(layer, LEFT, 250.0, RIGHT, 250.0);

    // Parties
    let pay_to = if voucher.pay_to.is_empty() {
        "_________________"
    } else {
        voucher.pay_to.as_str()
    };
    text(layer, &fonts.bold, "Pay To:", 10.0, LEFT, 241.0);
    text(layer, &fonts.regular, pay_to, 10.0, LEFT + 16.0, 241.0);
    text(layer, &fonts.bold, "Date:", 10.0, 150.0, 241.0);
    text(layer, &fonts.regular, &voucher.date, 10.0, 162.0, 241.0);

    // Payment method
    text(layer, &fonts.bold, "Payment by:", 10.0, LEFT, 231.0);
    let mut x = LEFT;
    for (label, checked) in layout::payment_boxes(voucher.payment_method) {
        frame(layer, x, 222.0, x + 4.0, 226.0);
        if checked {
            rule(layer, x, 222.0, x + 4.0, 226.0);
            rule(layer, x, 226.0, x + 4.0, 222.0);
        }
        text(layer, &fonts.regular, label, 10.0, x + 6.0, 222.5);
        x += 30.0;
    }
    if let Some(detail) = layout::payment_detail(voucher) {
        text(layer, &fonts.regular, &detail, 10.0, x + 5.0, 222.5);
    }

    // Items table
    let columns = [LEFT, 30.0, 120.0, 160.0, RIGHT];
    let mut y = 212.0;
    rule(layer, LEFT, y + 5.0, RIGHT, y + 5.0);
    for (index, header) in layout::ITEM_HEADERS.iter().enumerate() {
        text(layer, &fonts.bold, header, 9.0, columns[index] + 2.0, y);
    }
    y -= 3.0;
    rule(layer, LEFT, y, RIGHT, y);
    let table_top = y + 8.0;
    y -= 6.0;

    for (index, item) in voucher.items.iter().enumerate() {
        if y < ITEMS_FLOOR {
            let remaining = voucher.items.len() - index;
            let more = format!("... {} more item(s)", remaining);
            text(layer, &fonts.regular, &more, 9.0, columns[1] + 2.0, y);
            y -= 6.0;
            break;
        }
        let amount = layout::item_amount(item);
        text(layer, &fonts.regular, &(index + 1).to_string(), 9.0, columns[0] + 5.0, y);
        text(layer, &fonts.regular, &item.description, 9.0, columns[1] + 2.0, y);
        text(layer, &fonts.regular, &item.inv_no, 9.0, columns[2] + 2.0, y);
        text(layer, &fonts.regular, &amount, 9.0, right_aligned_x(&amount, 9.0, RIGHT - 2.0), y);
        y -= 6.0;
    }

    rule(layer, LEFT, y + 3.0, RIGHT, y + 3.0);
    let total = layout::money(voucher.total_amount);
    text(layer, &fonts.bold, "TOTAL RM", 10.0, 135.0, y - 2.0);
    text(layer, &fonts.bold, &total, 10.0, right_aligned_x(&total, 10.0, RIGHT - 2.0), y - 2.0);
    y -= 6.0;
    rule(layer, LEFT, y, RIGHT, y);
    for x in columns {
        rule(layer, x, table_top, x, y + 9.0);
    }
    rule(layer, LEFT, y + 9.0, LEFT, y);
    rule(layer, columns[3], y + 9.0, columns[3], y);
    rule(layer, RIGHT, y + 9.0, RIGHT, y);

    // Signatories
    let signatories = [
        (&voucher.prepared_by, &voucher.prepared_sig),
        (&voucher.approved_by, &voucher.approved_sig),
        (&voucher.received_by, &voucher.received_sig),
    ];
    let block_width = (RIGHT - LEFT) / 3.0;
    let mut drawn = 0;
    frame(layer, LEFT, 20.0, RIGHT, 55.0);
    let blocks = layout::SIGNATORY_HEADERS.iter().zip(signatories).enumerate();
    for (index, (header, (name, sig))) in blocks {
        let x = LEFT + block_width * index as f32;
        if index > 0 {
            rule(layer, x, 20.0, x, 55.0);
        }
        text(layer, &fonts.bold, header, 10.0, x + 15.0, 48.0);
        if let Some(value) = sig.as_deref().filter(|value| !value.trim().is_empty()) {
            match decode_signature(value) {
                Ok(image) => {
                    signature(layer, &image, x + 8.0, 31.0, block_width - 16.0);
                    drawn += 1;
                }
                Err(e) => warn!("Skipping {} signature on {}: {}", header, voucher.pv_number, e),
            }
        }
        rule(layer, x + 8.0, 30.0, x + block_width - 8.0, 30.0);
        text(layer, &fonts.regular, name, 9.0, x + 10.0, 24.0);
    }
    drawn
}
