//! Lightweight inline-style editing.
//!
//! Parses `style=""` attribute values into an ordered declaration list so
//! the swapper can set positioning and sizing properties without clobbering
//! whatever the page already declared.

/// Ordered inline style declarations. Property names are lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    decls: Vec<(String, String)>,
}

impl InlineStyle {
    /// Parse an inline `style="..."` attribute value.
    pub fn parse(style: &str) -> Self {
        let mut out = Self::default();
        for decl in style.split(';') {
            let Some((prop, val)) = decl.split_once(':') else {
                continue;
            };
            let prop = prop.trim();
            let val = val.trim();
            if prop.is_empty() || val.is_empty() {
                continue;
            }
            out.set(prop, val);
        }
        out
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        let property = property.to_ascii_lowercase();
        self.decls
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Set a property, replacing an earlier declaration in place.
    pub fn set(&mut self, property: &str, value: &str) {
        let property = property.to_ascii_lowercase();
        match self.decls.iter_mut().find(|(p, _)| *p == property) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.decls.push((property, value.to_string())),
        }
    }

    /// Serialize back to attribute form: `a: b; c: d`.
    pub fn to_css(&self) -> String {
        self.decls
            .iter()
            .map(|(p, v)| format!("{}: {}", p, v))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Pixel value of a property, if it is a plain px/unitless length.
    pub fn px(&self, property: &str) -> Option<f32> {
        self.get(property).and_then(parse_css_px)
    }
}

/// Parse a CSS length in px (or unitless) to f32. Relative units are not
/// resolvable without layout and yield `None`.
pub fn parse_css_px(val: &str) -> Option<f32> {
    let v = val.trim();
    let num = v.strip_suffix("px").unwrap_or(v).trim();
    num.parse::<f32>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_replace_in_place() {
        let mut style = InlineStyle::parse("width: 500px; POSITION:static;;bogus");
        style.set("position", "absolute");
        style.set("height", "100%");
        assert_eq!(style.to_css(), "width: 500px; position: absolute; height: 100%");
    }

    #[test]
    fn px_lengths() {
        let style = InlineStyle::parse("width: 640px; height: 50%; max-width: 800");
        assert_eq!(style.px("width"), Some(640.0));
        assert_eq!(style.px("height"), None);
        assert_eq!(style.px("max-width"), Some(800.0));
    }
}
