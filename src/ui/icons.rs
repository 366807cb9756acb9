//! Shared UI icons and emojis.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static UNDO: Emoji<'_, '_> = Emoji("↩️  ", "[UNDO]");

// Connection indicators
pub static LIVE: Emoji<'_, '_> = Emoji("🟢 ", "[LIVE]");
pub static OFFLINE: Emoji<'_, '_> = Emoji("⚪ ", "[OFF]");
pub static BROKEN: Emoji<'_, '_> = Emoji("🔴 ", "[FAIL]");

// Board indicators
pub static COLUMN: Emoji<'_, '_> = Emoji("📋 ", "#");
pub static PERSON: Emoji<'_, '_> = Emoji("👤 ", "@");
pub static ROUTE: Emoji<'_, '_> = Emoji("🧭 ", ">");
