//! UI Builder module for creating keyboards and formatting messages

use std::path::PathBuf;
use teloxide::utils::html;

use crate::action::{Action, BackTarget, LineOp, MenuTarget};
use crate::cart::CartSummary;
use crate::catalog::{Category, Product};
use crate::localization::Messages;

use super::channel::{Button, Keyboard, OutboundMessage, ReplyButton};

fn main_menu_button(messages: &Messages) -> Button {
    Button::new(messages.get("button-main-menu"), Action::Menu(MenuTarget::Main))
}

/// Lays buttons out `per_row` to a row
fn rows_of(buttons: Vec<Button>, per_row: usize) -> Vec<Vec<Button>> {
    buttons.chunks(per_row.max(1)).map(|c| c.to_vec()).collect()
}

pub fn category_label(messages: &Messages, category: Category) -> String {
    match category {
        Category::Cats => messages.get("category-cats"),
        Category::Dogs => messages.get("category-dogs"),
    }
}

pub fn main_menu_keyboard(messages: &Messages) -> Keyboard {
    Keyboard::Inline(rows_of(
        vec![
            Button::new(messages.get("menu-catalog"), Action::Menu(MenuTarget::Catalog)),
            Button::new(messages.get("menu-promo"), Action::Menu(MenuTarget::Promo)),
            Button::new(messages.get("menu-cart"), Action::Menu(MenuTarget::Cart)),
            Button::new(messages.get("menu-help"), Action::Menu(MenuTarget::Help)),
        ],
        2,
    ))
}

/// Main menu under the given heading
pub fn main_menu(messages: &Messages, heading: &str) -> OutboundMessage {
    OutboundMessage::text(heading).with_keyboard(main_menu_keyboard(messages))
}

pub fn category_picker(messages: &Messages) -> OutboundMessage {
    let buttons = Category::ALL
        .iter()
        .map(|c| Button::new(category_label(messages, *c), Action::PickCategory(*c)))
        .collect();
    let mut rows = rows_of(buttons, 2);
    rows.push(vec![main_menu_button(messages)]);

    OutboundMessage::text(messages.get("category-prompt")).with_keyboard(Keyboard::Inline(rows))
}

pub fn product_list(messages: &Messages, category: Category, products: &[Product]) -> OutboundMessage {
    let heading = match category {
        Category::Cats => messages.get("product-list-cats"),
        Category::Dogs => messages.get("product-list-dogs"),
    };
    let text = if products.is_empty() {
        format!("{heading}\n\n{}", messages.get("product-list-empty"))
    } else {
        heading
    };

    let mut rows: Vec<Vec<Button>> = products
        .iter()
        .map(|p| vec![Button::new(p.name.clone(), Action::ViewProduct(p.id))])
        .collect();
    rows.push(vec![
        Button::new(messages.get("button-back"), Action::Back(BackTarget::CategoryPicker)),
        main_menu_button(messages),
    ]);

    OutboundMessage::text(text).with_keyboard(Keyboard::Inline(rows))
}

/// Product card; `image` is `None` when the image file is missing
pub fn product_detail(messages: &Messages, product: &Product, image: Option<PathBuf>) -> OutboundMessage {
    let mut text = format!(
        "{}\n{}\n{}",
        html::bold(&html::escape(&product.name)),
        html::escape(&product.description),
        messages.get_with_args("product-price", &[("price", &product.price.to_string())])
    );
    if image.is_none() {
        text.push_str("\n\n");
        text.push_str(&messages.get("product-image-missing"));
    }

    let keyboard = Keyboard::Inline(vec![
        vec![Button::new(messages.get("button-add-to-cart"), Action::AddToCart(product.id))],
        vec![
            Button::new(
                messages.get("button-back"),
                Action::Back(BackTarget::Category(product.category)),
            ),
            main_menu_button(messages),
        ],
    ]);

    OutboundMessage::text(text).with_keyboard(keyboard).with_image(image)
}

pub fn promo(messages: &Messages) -> OutboundMessage {
    OutboundMessage::text(messages.get("promo-text"))
        .with_keyboard(Keyboard::Inline(vec![vec![main_menu_button(messages)]]))
}

/// Cart view with per-line controls
pub fn cart_view(messages: &Messages, summary: &CartSummary) -> OutboundMessage {
    if summary.is_empty() {
        return OutboundMessage::text(messages.get("cart-empty"))
            .with_keyboard(Keyboard::Inline(vec![vec![main_menu_button(messages)]]));
    }

    let mut text = format!("{}\n\n", messages.get("cart-title"));
    let mut rows = Vec::new();

    for resolved in &summary.lines {
        let position = resolved.index + 1;
        let quantity = resolved.line.quantity.to_string();
        let index = resolved.index;

        match (&resolved.product, resolved.line_total()) {
            (Some(product), Some(line_total)) => {
                text.push_str(&format!("{position}. {}\n", html::escape(&product.name)));
                text.push_str(&format!(
                    "    {}\n",
                    messages.get_with_args(
                        "cart-line-details",
                        &[("quantity", &quantity), ("price", &product.price.to_string())]
                    )
                ));
                text.push_str(&format!(
                    "    {}\n\n",
                    messages.get_with_args("cart-line-total", &[("total", &line_total.to_string())])
                ));
                rows.push(vec![
                    Button::new("➖", Action::EditLine { op: LineOp::Decrement, index }),
                    Button::new("🗑️", Action::EditLine { op: LineOp::Remove, index }),
                    Button::new("➕", Action::EditLine { op: LineOp::Increment, index }),
                ]);
            }
            _ => {
                let id = resolved.line.product_id.to_string();
                text.push_str(&format!(
                    "{position}. {}\n",
                    messages.get_with_args("cart-unknown-product", &[("id", &id)])
                ));
                text.push_str(&format!(
                    "    {}\n\n",
                    messages.get_with_args("cart-line-quantity", &[("quantity", &quantity)])
                ));
                rows.push(vec![Button::new(
                    messages.get("button-remove-unknown"),
                    Action::EditLine { op: LineOp::Remove, index },
                )]);
            }
        }
    }

    text.push_str(&messages.get_with_args("cart-total", &[("total", &summary.total.to_string())]));

    rows.push(vec![
        Button::new(messages.get("button-clear-cart"), Action::ClearCart),
        Button::new(messages.get("button-checkout"), Action::Checkout),
    ]);
    rows.push(vec![main_menu_button(messages)]);

    OutboundMessage::text(text).with_keyboard(Keyboard::Inline(rows))
}

/// Text prompt that also clears any reply keyboard
pub fn prompt_without_keyboard(text: String) -> OutboundMessage {
    OutboundMessage::text(text).with_keyboard(Keyboard::RemoveReply)
}

pub fn contact_request(text: String, messages: &Messages) -> OutboundMessage {
    OutboundMessage::text(text).with_keyboard(Keyboard::Reply(vec![vec![ReplyButton {
        label: messages.get("button-share-contact"),
        request_contact: true,
    }]]))
}

pub fn help_prompt(messages: &Messages) -> OutboundMessage {
    OutboundMessage::text(messages.get("help-prompt")).with_keyboard(Keyboard::Reply(vec![vec![
        ReplyButton {
            label: messages.get("button-cancel"),
            request_contact: false,
        },
    ]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CartLine, ResolvedLine};

    fn product() -> Product {
        Product {
            id: 4,
            name: "Kibble <Deluxe>".to_string(),
            category: Category::Dogs,
            subcategory: "big".to_string(),
            price: 1500,
            description: "Crunchy & tasty".to_string(),
            image_ref: "dog_big.jpg".to_string(),
        }
    }

    /// Inline actions in display order
    fn actions(keyboard: &Keyboard) -> Vec<Action> {
        match keyboard {
            Keyboard::Inline(rows) => rows.iter().flatten().map(|b| b.action).collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_main_menu_layout() {
        let messages = Messages::new().unwrap();
        let keyboard = main_menu_keyboard(&messages);
        match &keyboard {
            Keyboard::Inline(rows) => assert_eq!(rows.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2]),
            other => panic!("unexpected keyboard {other:?}"),
        }
        assert_eq!(
            actions(&keyboard).iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["menu:feed_type", "menu:promo", "menu:cart", "menu:help"]
        );
    }

    #[test]
    fn test_product_detail_escapes_and_notes_missing_image() {
        let messages = Messages::new().unwrap();
        let view = product_detail(&messages, &product(), None);

        assert!(view.text.contains("<b>Kibble &lt;Deluxe&gt;</b>"));
        assert!(view.text.contains("Crunchy &amp; tasty"));
        assert!(view.text.contains("Price: 1500 RUB"));
        assert!(view.text.contains("(Image not found)"));
        assert!(actions(&view.keyboard).contains(&Action::Back(BackTarget::Category(Category::Dogs))));
    }

    #[test]
    fn test_cart_view_unknown_line_gets_single_remove_button() {
        let messages = Messages::new().unwrap();
        let summary = CartSummary {
            lines: vec![
                ResolvedLine {
                    index: 0,
                    line: CartLine { product_id: 4, quantity: 2 },
                    product: Some(product()),
                },
                ResolvedLine {
                    index: 1,
                    line: CartLine { product_id: 99, quantity: 1 },
                    product: None,
                },
            ],
            total: 3000,
        };

        let view = cart_view(&messages, &summary);
        assert!(view.text.contains("Unknown product (ID: 99)"));
        assert!(view.text.contains("Total: 3000 RUB"));

        let Keyboard::Inline(rows) = &view.keyboard else {
            panic!("cart view must use an inline keyboard");
        };
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1].len(), 1);
        assert_eq!(rows[1][0].action.to_string(), "cart_item:delete_all:1");
    }
}
