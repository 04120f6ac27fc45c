//! Renders envelopes onto an output surface.
//!
//! # Design
//! The surface is any `io::Write`: stdout for the CLI, a `Vec<u8>` in
//! tests. Presenting never fails from the caller's point of view. A
//! serialization failure degrades to a plain-text dump, and write failures
//! are logged and dropped.

use std::fmt::Debug;
use std::io::Write;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::envelope::ApiResult;
use crate::error::{ApiError, RenderError};

pub struct Presenter<W: Write> {
    out: W,
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Wrap `data` in a fresh envelope and write it.
    pub fn present<T>(&mut self, data: &T, status: Option<u16>)
    where
        T: Serialize + Debug + ?Sized,
    {
        let text = match render(data, status) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "falling back to plain-text output");
                format!("failed to render response: {e}\nraw data: {data:?}")
            }
        };
        self.write(&text);
    }

    /// Write an envelope produced by the API client, keeping its timestamp.
    pub fn present_result(&mut self, result: &ApiResult) {
        let shown = ApiResult {
            data: normalize(result.data.clone()),
            ..result.clone()
        };
        match serde_json::to_string_pretty(&shown) {
            Ok(text) => self.write(&text),
            Err(e) => {
                warn!(error = %e, "falling back to plain-text output");
                self.write(&format!(
                    "failed to render response: {e}\nraw data: {result:?}"
                ));
            }
        }
    }

    pub fn present_error(&mut self, err: &ApiError) {
        self.present(&err.to_display(), err.display_status());
    }

    fn write(&mut self, text: &str) {
        let written = writeln!(self.out, "{text}").and_then(|()| self.out.flush());
        if let Err(e) = written {
            warn!(error = %e, "failed to write to output surface");
        }
    }
}

fn render<T: Serialize + ?Sized>(data: &T, status: Option<u16>) -> Result<String, RenderError> {
    let data = normalize(serde_json::to_value(data)?);
    Ok(serde_json::to_string_pretty(&ApiResult::new(data, status))?)
}

/// Text that is itself JSON is shown structured.
fn normalize(data: Value) -> Value {
    match data {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}
