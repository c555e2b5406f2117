#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Once;

use image::{DynamicImage, ImageFormat};
use serde_json::json;

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Encode a blank white page of the given size as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut img = DynamicImage::new_rgb8(width, height).to_rgb8();
    for pixel in img.pixels_mut() {
        *pixel = image::Rgb([255, 255, 255]);
    }
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .expect("Failed to encode PNG fixture");
    output
}

/// Write a PNG page into `dir` and return its path.
pub fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, png_bytes(320, 240)).expect("Failed to write PNG fixture");
    path
}

/// OpenAI-style chat completion body.
pub fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "test-model",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 1,
            "completion_tokens": 1,
            "total_tokens": 2
        }
    })
}

/// OpenAI-style error envelope.
pub fn api_error_body(message: &str, error_type: Option<&str>, code: Option<&str>) -> serde_json::Value {
    json!({
        "error": {
            "message": message,
            "type": error_type,
            "param": serde_json::Value::Null,
            "code": code
        }
    })
}

/// Gemini `generateContent` success body.
pub fn gemini_body(text: &str) -> serde_json::Value {
    json!({
        "candidates": [
            {
                "content": {
                    "role": "model",
                    "parts": [{ "text": text }]
                },
                "finishReason": "STOP"
            }
        ]
    })
}

/// LanguageTool `/v2/check` body with one match per `(offset, length, replacement, rule)`.
pub fn languagetool_body(matches: &[(usize, usize, &str, &str)]) -> serde_json::Value {
    let matches: Vec<serde_json::Value> = matches
        .iter()
        .map(|(offset, length, replacement, rule)| {
            json!({
                "message": format!("Possible error ({rule})"),
                "offset": offset,
                "length": length,
                "replacements": [{ "value": replacement }],
                "rule": { "id": rule }
            })
        })
        .collect();

    json!({
        "software": { "name": "LanguageTool", "version": "6.4" },
        "language": { "name": "English (US)", "code": "en-US" },
        "matches": matches
    })
}
