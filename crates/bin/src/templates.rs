//! HTML templates for web interface
//!
//! Simple inline HTML templates without a template engine.

use currex::currency::CurrencyCode;

use crate::flash::Flash;

/// Common CSS styles for all pages
const COMMON_STYLES: &str = r#"
    body {
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
        max-width: 560px;
        margin: 40px auto;
        padding: 0 20px;
        background: #f5f5f5;
    }
    .container {
        background: white;
        padding: 30px;
        border-radius: 8px;
        box-shadow: 0 2px 4px rgba(0,0,0,0.1);
    }
    h1 {
        color: #333;
        border-bottom: 2px solid #0066cc;
        padding-bottom: 10px;
    }
    .form-group {
        margin: 15px 0;
    }
    label {
        display: block;
        font-weight: bold;
        margin-bottom: 5px;
        color: #333;
    }
    input[type="text"],
    input[type="password"],
    select {
        width: 100%;
        padding: 10px;
        border: 1px solid #ddd;
        border-radius: 4px;
        font-size: 14px;
        box-sizing: border-box;
    }
    button {
        background: #0066cc;
        color: white;
        padding: 10px 20px;
        border: none;
        border-radius: 4px;
        cursor: pointer;
        font-size: 14px;
        font-weight: bold;
    }
    button:hover {
        background: #0052a3;
    }
    .logout {
        float: right;
        font-size: 14px;
    }
    .flash {
        padding: 10px;
        border-radius: 4px;
        margin: 10px 0;
    }
    .flash-danger { color: #a94442; background: #f2dede; }
    .flash-warning { color: #8a6d3b; background: #fcf8e3; }
    .flash-success { color: #3c763d; background: #dff0d8; }
    .flash-info { color: #31708f; background: #d9edf7; }
    .result {
        font-size: 20px;
        font-weight: bold;
        color: #0066cc;
        margin-top: 20px;
    }
"#;

fn flash_html(flash: Option<Flash>) -> String {
    flash.map_or(String::new(), |f| {
        format!(
            r#"<div class="flash flash-{}">{}</div>"#,
            f.level(),
            html_escape(f.message())
        )
    })
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>currex - {title}</title>
    <style>{COMMON_STYLES}</style>
</head>
<body>
    <div class="container">
{body}
    </div>
</body>
</html>"#
    )
}

/// Render the login page
pub fn login_page(flash: Option<Flash>) -> String {
    let flash_html = flash_html(flash);
    page(
        "Login",
        &format!(
            r#"        <h1>Login</h1>
        {flash_html}
        <form method="POST" action="/login">
            <div class="form-group">
                <label for="username">Username:</label>
                <input type="text" id="username" name="username" required autofocus>
            </div>
            <div class="form-group">
                <label for="password">Password:</label>
                <input type="password" id="password" name="password" required>
            </div>
            <button type="submit">Login</button>
        </form>
        <p style="margin-top: 20px; text-align: center;">
            Don't have an account? <a href="/register">Register here</a>
        </p>"#
        ),
    )
}

/// Render the registration page
pub fn register_page(flash: Option<Flash>) -> String {
    let flash_html = flash_html(flash);
    page(
        "Register",
        &format!(
            r#"        <h1>Register New Account</h1>
        {flash_html}
        <form method="POST" action="/register">
            <div class="form-group">
                <label for="username">Username:</label>
                <input type="text" id="username" name="username" required autofocus>
            </div>
            <div class="form-group">
                <label for="password">Password:</label>
                <input type="password" id="password" name="password" required>
            </div>
            <button type="submit">Create Account</button>
        </form>
        <p style="margin-top: 20px; text-align: center;">
            Already have an account? <a href="/login">Login here</a>
        </p>"#
        ),
    )
}

fn currency_options(selected: CurrencyCode) -> String {
    CurrencyCode::ALL
        .iter()
        .map(|code| {
            let selected_attr = if *code == selected { " selected" } else { "" };
            format!(r#"<option value="{code}"{selected_attr}>{code}</option>"#)
        })
        .collect::<Vec<_>>()
        .join("\n                    ")
}

/// Render the converter page
///
/// `result` is the formatted conversion line, if one was just computed.
pub fn converter_page(username: &str, result: Option<&str>, flash: Option<Flash>) -> String {
    let flash_html = flash_html(flash);
    let result_html = result.map_or(String::new(), |r| {
        format!(r#"<div class="result">{}</div>"#, html_escape(r))
    });
    let from_options = currency_options(CurrencyCode::Usd);
    let to_options = currency_options(CurrencyCode::Eur);

    page(
        "Converter",
        &format!(
            r#"        <h1>Currency Converter
            <a class="logout" href="/logout">Logout</a>
        </h1>
        <p>Signed in as <strong>{}</strong></p>
        {flash_html}
        <form method="POST" action="/converter">
            <div class="form-group">
                <label for="amount">Amount:</label>
                <input type="text" id="amount" name="amount" inputmode="decimal" required autofocus>
            </div>
            <div class="form-group">
                <label for="from_currency">From:</label>
                <select id="from_currency" name="from_currency">
                    {from_options}
                </select>
            </div>
            <div class="form-group">
                <label for="to_currency">To:</label>
                <select id="to_currency" name="to_currency">
                    {to_options}
                </select>
            </div>
            <button type="submit">Convert</button>
        </form>
        {result_html}"#,
            html_escape(username)
        ),
    )
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
