//! 画像バイト列 ⇔ 転送用テキストの変換
//!
//! 標準アルファベット（パディングあり）のBase64。
//! `decode(encode(b)) == b` が任意のバイト列で成り立つ。

use crate::error::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// バイト列をBase64文字列へ変換（全域関数）
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Base64文字列をバイト列へ戻す
pub fn decode(text: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(text.trim())?)
}
