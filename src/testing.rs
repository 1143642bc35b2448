use crate::dom::StaticDocument;
use crate::selector::Query;
use crate::types::{ElementHandle, ElementSnapshot};

pub const PRODUCT_TABLE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Phones</title></head>
<body>
  <div class="catalog">
    <h2>Phones</h2>
    <table class="products">
      <tr class="product-row">
        <td class="name">Pixel 8</td>
        <td class="price">$699</td>
        <td><button class="add-to-cart" value="pixel-8">Add to Cart</button></td>
      </tr>
      <tr class="product-row">
        <td class="name">iPhone 15 Pro</td>
        <td class="price">$999</td>
        <td><button class="add-to-cart" value="iphone-15-pro">Add to Cart</button></td>
      </tr>
    </table>
  </div>
</body>
</html>"#;

pub const LOGIN_FORM: &str = r#"<!DOCTYPE html>
<html>
<head><title>Sign in</title><style>.hidden { display: none; }</style></head>
<body>
  <form id="login-form" class="auth-form">
    <label for="email">Email</label>
    <input id="email" name="email" type="email" placeholder="you@example.com">
    <label for="password">Password</label>
    <input id="password" name="password" type="password">
    <input type="hidden" name="csrf" value="f00d">
    <button type="submit" class="btn btn-primary" data-testid="login-submit">Sign in</button>
    <a href="/forgot">Forgot password?</a>
  </form>
</body>
</html>"#;

pub const NAV_LIST: &str = r#"<!DOCTYPE html>
<html>
<body>
  <nav id="main-nav">
    <ul class="menu">
      <li class="menu-item"><a href="/">Home</a></li>
      <li class="menu-item"><a href="/pricing">Pricing</a></li>
      <li class="menu-item"><a href="/docs">Docs</a></li>
    </ul>
  </nav>
</body>
</html>"#;

/// Fixture documents and lookups shared by unit tests and demos.
pub struct TestHelper;

impl TestHelper {
    /// Two product rows, each with its own "Add to Cart" button.
    pub fn product_table() -> StaticDocument {
        StaticDocument::parse(PRODUCT_TABLE)
    }

    pub fn login_form() -> StaticDocument {
        StaticDocument::parse(LOGIN_FORM)
    }

    pub fn nav_list() -> StaticDocument {
        StaticDocument::parse(NAV_LIST)
    }

    /// Handle of the first element matching `selector`.
    ///
    /// Panics when nothing matches; fixtures are expected to be well formed.
    pub fn handle_of(doc: &StaticDocument, selector: &str) -> ElementHandle {
        let query = Query::parse(selector).expect("fixture selector parses");
        let hits = doc.evaluate(&query).expect("fixture selector evaluates");
        ElementHandle(*hits.first().unwrap_or_else(|| panic!("no fixture element matches {}", selector)))
    }

    pub fn snapshot_of(doc: &StaticDocument, selector: &str) -> ElementSnapshot {
        let handle = Self::handle_of(doc, selector);
        doc.snapshot(handle.0).expect("fixture handle is in range")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_parse() {
        let table = TestHelper::product_table();
        assert_eq!(
            table.evaluate(&Query::parse("button.add-to-cart").unwrap()).unwrap().len(),
            2
        );

        let snapshot = TestHelper::snapshot_of(&TestHelper::nav_list(), "li:nth-child(2) > a");
        assert_eq!(snapshot.text_content.as_deref(), Some("Pricing"));
        assert!(snapshot.xpath.unwrap().ends_with("li[2]/a"));
    }
}
