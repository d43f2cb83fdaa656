//! Reply templates.
//!
//! Every user-visible string the bot produces comes from here, tagged with
//! the [`TemplateId`] that made it.

use std::fmt::Write;

use sb_nlu::ranking;
use sb_protocol::catalog::{OrderRecord, OrderStatus, Product};
use sb_protocol::intent::{IntentKind, SlotName};
use sb_protocol::session::{Response, TemplateId};

const DATE_FORMAT: &str = "%B %d, %Y";
const DESCRIPTION_LIMIT: usize = 80;

fn response(template: TemplateId, text: impl Into<String>) -> Response {
    Response {
        template,
        text: text.into(),
    }
}

pub fn welcome() -> Response {
    response(
        TemplateId::Welcome,
        "👋 Hello! Welcome to our store! I'm your virtual assistant.\n\n\
         I can help you with:\n\
         • 📦 Tracking your orders\n\
         • 🔍 Finding products\n\
         • 💡 Product recommendations\n\
         • ❓ Questions about shipping, returns and payment\n\n\
         How can I assist you today?",
    )
}

pub fn help() -> Response {
    response(
        TemplateId::Help,
        "I'm here to help! Here's what I can do:\n\n\
         **Order Management:**\n\
         • Track orders - say 'track my order' or give me your order number\n\
         • Cancel orders - say 'cancel my order'\n\n\
         **Product Discovery:**\n\
         • Search products - tell me what you're looking for\n\
         • Get recommendations - ask 'recommend me a laptop'\n\n\
         **Customer Service:**\n\
         • Shipping information\n\
         • Return policy\n\
         • Payment methods\n\
         • General FAQs\n\n\
         Just type your question and I'll do my best to help!",
    )
}

pub fn farewell() -> Response {
    response(
        TemplateId::Farewell,
        "Thank you for chatting with us! Have a wonderful day! \
         Feel free to come back if you need any assistance. 😊",
    )
}

pub fn return_policy() -> Response {
    response(
        TemplateId::ReturnPolicy,
        "**📦 Our Return Policy**\n\n\
         • ✅ **30-day money-back guarantee** on all products\n\
         • ✅ Items must be in **original condition** with tags attached\n\
         • ✅ Free return shipping on defective items\n\
         • ✅ Refunds processed within **5-7 business days**\n\n\
         **To start a return:**\n\
         1. Go to 'My Orders' in your account\n\
         2. Select the order and click 'Return Item'\n\
         3. Choose your reason and print the return label\n\
         4. Ship the item back to us\n\n\
         Do you need help with a specific return?",
    )
}

pub fn shipping_info() -> Response {
    response(
        TemplateId::ShippingInfo,
        "**🚚 Shipping Information**\n\n\
         **Standard (5-7 business days):** FREE over $50, otherwise $5.99\n\
         **Express (2-3 business days):** $15.00 flat rate\n\
         **Overnight (1 business day):** $25.00 flat rate\n\
         **International:** 50+ countries, 7-14 business days, rates vary by destination\n\n\
         📦 All orders come with tracking information sent to your email!\n\n\
         Need help with a specific order?",
    )
}

pub fn payment_methods() -> Response {
    response(
        TemplateId::PaymentMethods,
        "**💳 Accepted Payment Methods**\n\n\
         **Credit/Debit Cards:** Visa, Mastercard, American Express, Discover\n\
         **Digital Wallets:** PayPal, Apple Pay, Google Pay\n\n\
         🔒 All transactions are **secure and encrypted**. \
         We do NOT store your full card number.\n\n\
         Ready to make a purchase?",
    )
}

fn slot_hint(slot: SlotName) -> &'static str {
    match slot {
        SlotName::OrderNumber => "order number? It should look like ORD-2026-00001.",
    }
}

/// First request for a slot the target intent needs.
pub fn slot_prompt(target: IntentKind, slot: SlotName) -> Response {
    let lead = match target {
        IntentKind::TrackOrder => "I'd be happy to help you track your order!",
        IntentKind::CancelOrder => "I can help you cancel your order.",
        _ => "I can help with that.",
    };
    response(
        TemplateId::SlotPrompt,
        format!("{lead} Could you please provide your {}", slot_hint(slot)),
    )
}

/// Second (and last) request after the user answered without the slot.
pub fn slot_reprompt(_target: IntentKind, slot: SlotName) -> Response {
    response(
        TemplateId::SlotReprompt,
        format!(
            "Sorry, I didn't catch that. Could you share your {}",
            slot_hint(slot)
        ),
    )
}

fn status_emoji(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "⏳",
        OrderStatus::Processing => "⚙️",
        OrderStatus::Shipped => "🚚",
        OrderStatus::Delivered => "✅",
        OrderStatus::Cancelled => "❌",
    }
}

pub fn order_status(order: &OrderRecord) -> Response {
    let mut text = format!(
        "{} **Order Status: {}**\n\n",
        status_emoji(order.status),
        order.status
    );
    let _ = writeln!(text, "**Order Number:** {}", order.order_number);
    let _ = writeln!(text, "**Order Date:** {}", order.order_date.format(DATE_FORMAT));
    let _ = writeln!(text, "**Total Amount:** ${:.2}", order.total_amount);
    if let Some(tracking) = &order.tracking_number {
        let _ = writeln!(text, "**Tracking Number:** {tracking}");
    }
    if let Some(eta) = order.estimated_delivery {
        let _ = writeln!(text, "**Estimated Delivery:** {}", eta.format(DATE_FORMAT));
    }
    match order.status {
        OrderStatus::Shipped => text.push_str("\n📍 Your order is on its way!"),
        OrderStatus::Delivered => {
            text.push_str("\n🎉 Your order has been delivered! We hope you enjoy your purchase!")
        }
        OrderStatus::Processing => text.push_str("\n⚙️ Your order is being prepared for shipment."),
        OrderStatus::Pending | OrderStatus::Cancelled => {}
    }
    text.push_str("\n\nIs there anything else I can help you with?");
    response(TemplateId::OrderStatus, text)
}

pub fn order_not_found(order_number: &str) -> Response {
    response(
        TemplateId::OrderNotFound,
        format!(
            "I couldn't find an order with number {order_number}. Please check the order \
             number and try again, or contact customer service if you need assistance."
        ),
    )
}

pub fn cancellation_confirmed(order_number: &str) -> Response {
    response(
        TemplateId::CancellationConfirmed,
        format!(
            "❌ Your order {order_number} has been cancelled. A refund will be issued to \
             your original payment method within 5-7 business days."
        ),
    )
}

pub fn cancellation_rejected(order_number: &str, status: OrderStatus) -> Response {
    let reason = match status {
        OrderStatus::Cancelled => "it has already been cancelled".to_string(),
        other => format!("it is already {}", other.as_str().to_lowercase()),
    };
    response(
        TemplateId::CancellationRejected,
        format!(
            "Sorry, order {order_number} can't be cancelled because {reason}. \
             You can still return it within 30 days of delivery. Type 'return policy' for details."
        ),
    )
}

fn write_products(text: &mut String, products: &[Product], explain: bool) {
    for (i, product) in products.iter().enumerate() {
        let stars = "⭐".repeat(product.rating.clamp(0.0, 5.0) as usize);
        let _ = writeln!(text, "**{}. {}**", i + 1, product.name);
        let _ = writeln!(text, "   💰 ${:.2}", product.price);
        let _ = writeln!(text, "   {stars} {:.1}/5.0", product.rating);
        if let Some(desc) = product.description.as_deref().filter(|d| !d.is_empty()) {
            if desc.chars().count() > DESCRIPTION_LIMIT {
                let short: String = desc.chars().take(DESCRIPTION_LIMIT).collect();
                let _ = writeln!(text, "   📝 {short}...");
            } else {
                let _ = writeln!(text, "   📝 {desc}");
            }
        }
        if explain {
            let _ = writeln!(text, "   💡 {}", ranking::explain(product));
        }
        text.push('\n');
    }
}

/// Search results. `context` describes what was searched for.
pub fn product_list(products: &[Product], context: &str) -> Response {
    let plural = if products.len() == 1 { "" } else { "s" };
    let mut text = format!("I found {} product{plural}", products.len());
    if !context.is_empty() {
        let _ = write!(text, " for {context}");
    }
    text.push_str(":\n\n");
    write_products(&mut text, products, false);
    text.push_str("Would you like more details about any of these products?");
    response(TemplateId::ProductList, text)
}

pub fn no_products(context: &str) -> Response {
    let what = if context.is_empty() {
        String::new()
    } else {
        format!(" matching '{context}'")
    };
    response(
        TemplateId::NoProducts,
        format!(
            "I couldn't find any products{what}. Could you try a different search term, \
             or let me know what category you're interested in?"
        ),
    )
}

/// Recommended products, or popular ones when `personalized` is false.
pub fn recommendations(products: &[Product], category: Option<&str>, personalized: bool) -> Response {
    let mut text = if personalized {
        "Based on your preferences, I recommend these products".to_string()
    } else {
        "Here are some of our most popular products".to_string()
    };
    if let Some(category) = category {
        let _ = write!(text, " in the {category} category");
    }
    text.push_str(":\n\n");
    write_products(&mut text, products, true);
    text.push_str("Would you like more details about any of these products?");
    response(TemplateId::Recommendations, text)
}

pub fn faq_answer(answer: &str) -> Response {
    response(TemplateId::FaqAnswer, answer)
}

pub fn fallback() -> Response {
    response(
        TemplateId::Fallback,
        "I'm not quite sure I understand. Could you rephrase that?\n\n\
         I can help you with:\n\
         • Tracking orders\n\
         • Finding products\n\
         • Shipping & return information\n\
         • General questions\n\n\
         Or type 'help' to see all my capabilities!",
    )
}

/// Shown when a collaborator fails. Offers a human; never includes the cause.
pub fn apology() -> Response {
    response(
        TemplateId::Apology,
        "😓 I apologize, but I ran into a problem processing your request.\n\n\
         Please try again in a moment, or reach our customer service team:\n\
         📧 support@ecommerce.com\n\
         📞 1-800-555-0123 (Mon-Fri, 8 AM - 8 PM EST)",
    )
}
