//! Tag-diff emitter for the markup protocol.
//!
//! Speech instructions are linear, markup is hierarchical.  [`TagSet`] tracks
//! the value of each prosody element; whenever a value changes the set turns
//! dirty, and the next [`TagSet::emit`] closes every open element and reopens
//! the current ones in a stable order.

use std::fmt::Write as _;

/// The elements the markup engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupTag {
    Pitch,
    Volume,
    Rate,
    Spell,
}

impl MarkupTag {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkupTag::Pitch => "pitch",
            MarkupTag::Volume => "volume",
            MarkupTag::Rate => "rate",
            MarkupTag::Spell => "spell",
        }
    }
}

pub type Attributes = Vec<(&'static str, i64)>;

/// Staged element values plus the list of elements currently open.
#[derive(Debug, Clone)]
pub struct TagSet {
    // insertion order; restaging an existing tag keeps its slot
    tags: Vec<(MarkupTag, Attributes)>,
    open: Vec<MarkupTag>,
    dirty: bool,
}

impl Default for TagSet {
    fn default() -> Self {
        Self { tags: Vec::new(), open: Vec::new(), dirty: true }
    }
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Stage `tag` without touching the dirty flag.
    pub fn set(&mut self, tag: MarkupTag, attrs: Attributes) {
        match self.tags.iter_mut().find(|(t, _)| *t == tag) {
            Some(slot) => slot.1 = attrs,
            None => self.tags.push((tag, attrs)),
        }
    }

    /// Stage `tag` and mark the set dirty.
    pub fn stage(&mut self, tag: MarkupTag, attrs: Attributes) {
        self.set(tag, attrs);
        self.dirty = true;
    }

    /// Drop `tag` (if staged) and mark the set dirty.
    pub fn unstage(&mut self, tag: MarkupTag) {
        self.tags.retain(|(t, _)| *t != tag);
        self.dirty = true;
    }

    /// Write the minimal delta: nothing when clean, otherwise close all open
    /// elements innermost first and open every staged one.
    pub fn emit(&mut self, out: &mut String) {
        if !self.dirty {
            return;
        }
        for tag in self.open.drain(..).rev() {
            let _ = write!(out, "</{}>", tag.as_str());
        }
        for (tag, attrs) in &self.tags {
            out.push('<');
            out.push_str(tag.as_str());
            for (key, value) in attrs {
                let _ = write!(out, " {}=\"{}\"", key, value);
            }
            out.push('>');
            self.open.push(*tag);
        }
        self.dirty = false;
    }

    /// Close every open element while keeping the staged values, so the next
    /// emit reopens them.
    pub fn close_all(&mut self, out: &mut String) {
        for tag in self.open.drain(..).rev() {
            let _ = write!(out, "</{}>", tag.as_str());
        }
        self.dirty = true;
    }
}

/// Escape literal text for the markup payload.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value (quotes included).
pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
