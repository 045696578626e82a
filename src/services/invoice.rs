//! One-page PDF invoice rendered after a confirmed payment. The artifact
//! is uploaded to blob storage and linked from the confirmation email.

use crate::error::ApiError;
use crate::models::models::{Order, Phone};
use crate::models::status::FulfillmentType;
use crate::utility::{format_currency, grade_label};
use printpdf::{BuiltinFont, Mm, PdfDocument};

pub fn render_invoice_pdf(order: &Order, phone: &Phone) -> Result<Vec<u8>, ApiError> {
    let invoice_no = &order.id.to_string()[..8];
    let (doc, page, layer) = PdfDocument::new(
        format!("HSO Invoice {}", invoice_no),
        Mm(210.0),
        Mm(297.0),
        "Invoice",
    );

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ApiError::Internal(format!("invoice font: {}", e)))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ApiError::Internal(format!("invoice font: {}", e)))?;

    let layer = doc.get_page(page).get_layer(layer);

    // Header
    layer.use_text("HSO", 28.0, Mm(20.0), Mm(270.0), &bold);
    layer.use_text("Second-hand phones, Willemstad", 9.0, Mm(20.0), Mm(264.0), &font);
    layer.use_text("INVOICE", 18.0, Mm(150.0), Mm(270.0), &bold);
    layer.use_text(format!("Invoice #: {}", invoice_no), 9.0, Mm(150.0), Mm(264.0), &font);
    layer.use_text(
        format!("Date: {}", order.created_at.format("%Y-%m-%d")),
        9.0,
        Mm(150.0),
        Mm(259.0),
        &font,
    );

    // Buyer
    layer.use_text("Billed to", 10.0, Mm(20.0), Mm(240.0), &bold);
    layer.use_text(&order.buyer_name, 10.0, Mm(20.0), Mm(234.0), &font);
    layer.use_text(&order.buyer_email, 9.0, Mm(20.0), Mm(229.0), &font);
    layer.use_text(&order.buyer_phone, 9.0, Mm(20.0), Mm(224.0), &font);
    let mut y = 219.0;
    if order.fulfillment_type == FulfillmentType::Delivery.as_str() {
        if let Some(address) = order.delivery_address.as_deref() {
            layer.use_text(format!("Deliver to: {}", address), 9.0, Mm(20.0), Mm(y), &font);
            y -= 5.0;
        }
    }

    // Line item
    y -= 15.0;
    layer.use_text("Item", 10.0, Mm(20.0), Mm(y), &bold);
    layer.use_text("Amount", 10.0, Mm(160.0), Mm(y), &bold);
    y -= 7.0;
    layer.use_text(
        format!("{} {}", phone.brand, phone.model),
        10.0,
        Mm(20.0),
        Mm(y),
        &font,
    );
    layer.use_text(
        format_currency(order.amount_cents - order.delivery_fee_cents),
        10.0,
        Mm(160.0),
        Mm(y),
        &font,
    );
    y -= 5.0;
    let mut spec_parts = Vec::new();
    if let Some(gb) = phone.storage_gb {
        spec_parts.push(if gb >= 1024 {
            format!("{}TB", gb / 1024)
        } else {
            format!("{}GB", gb)
        });
    }
    if let Some(color) = phone.color.as_deref() {
        spec_parts.push(color.to_string());
    }
    if let Some(pct) = phone.battery_pct {
        spec_parts.push(format!("battery {}%", pct));
    }
    spec_parts.push(format!("grade {}", grade_label(phone.grade.as_deref())));
    layer.use_text(spec_parts.join(" / "), 8.0, Mm(20.0), Mm(y), &font);

    if order.delivery_fee_cents > 0 {
        y -= 7.0;
        layer.use_text("Delivery fee", 10.0, Mm(20.0), Mm(y), &font);
        layer.use_text(
            format_currency(order.delivery_fee_cents),
            10.0,
            Mm(160.0),
            Mm(y),
            &font,
        );
    }

    // Total
    y -= 12.0;
    layer.use_text("Total", 12.0, Mm(20.0), Mm(y), &bold);
    layer.use_text(format_currency(order.amount_cents), 12.0, Mm(160.0), Mm(y), &bold);

    layer.use_text(
        "Thank you for shopping with HSO!",
        9.0,
        Mm(20.0),
        Mm(30.0),
        &font,
    );

    doc.save_to_bytes()
        .map_err(|e| ApiError::Internal(format!("invoice render: {}", e)))
}
