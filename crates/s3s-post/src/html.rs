//! Hidden form inputs
//!
//! Rendered with askama templates; names and values are HTML-escaped.

use askama::Template;

/// One `<input type="hidden" .../>` element per line.
#[derive(Template)]
#[template(path = "hidden_inputs.html")]
struct HiddenInputs<'a> {
    inputs: Vec<(&'a str, &'a str)>,
}

/// A complete `multipart/form-data` upload form.
#[derive(Template)]
#[template(path = "upload_form.html")]
struct UploadForm<'a> {
    action: &'a str,
    inputs: Vec<(&'a str, &'a str)>,
}

/// Renders one `<input type="hidden" .../>` element per line.
///
/// # Errors
/// Returns an error if the template fails to render.
pub fn hidden_inputs<'a>(inputs: impl IntoIterator<Item = (&'a str, &'a str)>) -> askama::Result<String> {
    let view = HiddenInputs {
        inputs: inputs.into_iter().collect(),
    };
    view.render()
}

/// Renders a `<form>` posting to `action` with the hidden inputs, a file
/// field and a submit button.
///
/// # Errors
/// Returns an error if the template fails to render.
pub fn upload_form<'a>(action: &'a str, inputs: impl IntoIterator<Item = (&'a str, &'a str)>) -> askama::Result<String> {
    let view = UploadForm {
        action,
        inputs: inputs.into_iter().collect(),
    };
    view.render()
}
