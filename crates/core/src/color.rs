// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fair reuse of a fixed six-colour palette across concurrent jobs.

use parking_lot::Mutex;
use std::sync::Arc;

/// The fixed palette, in the order new leases favour them when all are
/// equally idle.
pub const PALETTE: [Color; 6] = [
    Color::Yellow,
    Color::Blue,
    Color::Red,
    Color::Green,
    Color::Magenta,
    Color::Cyan,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Yellow,
    Blue,
    Red,
    Green,
    Magenta,
    Cyan,
}

impl Color {
    /// Standard 8-colour ANSI foreground code.
    pub fn ansi_code(&self) -> u8 {
        match self {
            Color::Yellow => 33,
            Color::Blue => 34,
            Color::Red => 31,
            Color::Green => 32,
            Color::Magenta => 35,
            Color::Cyan => 36,
        }
    }

    /// Wrap `text` in this colour's escape codes. `bold` matches the
    /// supervisor's `FAILED` / output-timeout banners.
    pub fn paint(&self, text: &str, bold: bool) -> String {
        if bold {
            format!("\x1b[1;{}m{}\x1b[0m", self.ansi_code(), text)
        } else {
            format!("\x1b[{}m{}\x1b[0m", self.ansi_code(), text)
        }
    }
}

struct Inner {
    // Insertion-ordered; a lease re-appends its chosen colour to the end.
    slots: Vec<(Color, u32)>,
}

/// Fixed ordered palette with in-use counts. `lease()` picks the
/// least-recently-leased colour among those currently idle, falling back to
/// the least-recently-leased colour overall when every colour is in use.
pub struct ColorPool {
    inner: Arc<Mutex<Inner>>,
}

impl Default for ColorPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorPool {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                slots: PALETTE.iter().map(|&c| (c, 0)).collect(),
            })),
        }
    }

    pub fn lease(&self) -> ColorLease {
        let color = {
            let mut inner = self.inner.lock();
            let pos = inner
                .slots
                .iter()
                .position(|(_, count)| *count == 0)
                .unwrap_or(0);
            let (color, count) = inner.slots.remove(pos);
            inner.slots.push((color, count + 1));
            color
        };
        ColorLease {
            pool: Arc::clone(&self.inner),
            color,
        }
    }
}

/// RAII lease: releases its colour (decrements the in-use count) on drop.
/// Scoped to exactly one `run()` attempt loop, so a retry loop holds a
/// single colour for all of its attempts.
pub struct ColorLease {
    pool: Arc<Mutex<Inner>>,
    color: Color,
}

impl ColorLease {
    pub fn color(&self) -> Color {
        self.color
    }
}

impl Drop for ColorLease {
    fn drop(&mut self) {
        let mut inner = self.pool.lock();
        if let Some(slot) = inner.slots.iter_mut().find(|(c, _)| *c == self.color) {
            slot.1 = slot.1.saturating_sub(1);
        }
    }
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
