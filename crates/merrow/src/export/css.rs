//! CSS cloning.
//!
//! A document rule is cloned when its selector could match the drawing: the
//! last compound of the selector is checked against the class names and
//! element names present in the serialized markup. Cloned rules are scoped
//! to the graphic by prefixing `#{id}`.

use std::collections::HashSet;

use merrow_core::{scene::StyleRule, semantic::ClassDef};

/// `classDef` name applied to every vertex.
const DEFAULT_CLASS: &str = "default";

/// Builds the stylesheet embedded into graphic `id`.
pub(super) fn cloned_css(
    id: &str,
    markup: &str,
    rules: &[StyleRule],
    classes: &[ClassDef],
) -> String {
    let used = UsedNames::scan(markup);
    let mut css = String::new();

    for rule in rules {
        for selector in rule.selector().split(',').map(str::trim) {
            if !selector.is_empty() && used.matches(selector) {
                css.push_str(&format!("#{id} {selector} {{ {} }}\n", rule.declarations()));
            }
        }
    }

    for class in classes {
        if class.styles().is_empty() {
            continue;
        }
        let selector = if class.name() == DEFAULT_CLASS {
            ".node > *".to_string()
        } else {
            format!(".{} > *", class.name())
        };
        let declarations = class
            .styles()
            .iter()
            .map(|style| format!("{} !important;", style.trim()))
            .collect::<Vec<_>>()
            .join(" ");
        css.push_str(&format!("#{id} {selector} {{ {declarations} }}\n"));
    }

    css
}

/// Class and element names that occur in a piece of markup.
#[derive(Debug, Default)]
struct UsedNames {
    classes: HashSet<String>,
    elements: HashSet<String>,
    ids: HashSet<String>,
}

impl UsedNames {
    fn scan(markup: &str) -> Self {
        let mut used = Self::default();

        for value in attribute_values(markup, "class") {
            used.classes
                .extend(value.split_whitespace().map(str::to_string));
        }
        for value in attribute_values(markup, "id") {
            used.ids.insert(value.to_string());
        }
        for tag in markup.split('<').skip(1) {
            let name: String = tag
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == ':')
                .collect();
            if !name.is_empty() {
                used.elements.insert(name);
            }
        }

        used
    }

    /// Checks the last compound of `selector` against the scanned names.
    fn matches(&self, selector: &str) -> bool {
        let Some(compound) = selector
            .rsplit(|c: char| c.is_whitespace() || matches!(c, '>' | '+' | '~'))
            .find(|part| !part.is_empty())
        else {
            return false;
        };
        // Pseudo-classes and attribute filters do not narrow the match here.
        let compound = compound
            .split([':', '['])
            .next()
            .unwrap_or_default();

        let mut parts = compound.split(['.', '#']);
        let element = parts.next().unwrap_or_default();
        if !element.is_empty() && element != "*" && !self.elements.contains(element) {
            return false;
        }

        let mut rest = &compound[element.len()..];
        let mut constrained = !element.is_empty();
        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['.', '#']).unwrap_or(body.len());
            let name = &body[..end];
            let found = match marker {
                '.' => self.classes.contains(name),
                _ => self.ids.contains(name),
            };
            if !found {
                return false;
            }
            constrained = true;
            rest = &body[end..];
        }
        constrained
    }
}

/// Values of every `name="..."` attribute in `markup`.
fn attribute_values<'a>(markup: &'a str, name: &str) -> Vec<&'a str> {
    let needle = format!(" {name}=\"");
    markup
        .match_indices(&needle)
        .filter_map(|(at, _)| {
            let start = at + needle.len();
            markup[start..].find('"').map(|len| &markup[start..start + len])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKUP: &str = r#"<svg id="g1"><g class="node hot" id="a"><rect class="box"/></g><text class="label">x</text></svg>"#;

    fn rules(pairs: &[(&str, &str)]) -> Vec<StyleRule> {
        pairs
            .iter()
            .map(|(selector, declarations)| StyleRule::new(*selector, *declarations))
            .collect()
    }

    #[test]
    fn test_class_rules_cloned_when_used() {
        let css = cloned_css(
            "g1",
            MARKUP,
            &rules(&[(".node", "fill: red"), (".cluster", "fill: blue")]),
            &[],
        );
        assert_eq!(css, "#g1 .node { fill: red }\n");
    }

    #[test]
    fn test_element_and_descendant_selectors() {
        let css = cloned_css(
            "g1",
            MARKUP,
            &rules(&[
                ("svg text", "font-size: 12px"),
                ("circle", "r: 3"),
                ("g > rect.box", "stroke: 0"),
            ]),
            &[],
        );
        assert!(css.contains("#g1 svg text { font-size: 12px }"));
        assert!(css.contains("#g1 g > rect.box { stroke: 0 }"));
        assert!(!css.contains("circle"));
    }

    #[test]
    fn test_selector_lists_split() {
        let css = cloned_css("g1", MARKUP, &rules(&[(".hot, .cold", "opacity: 0.5")]), &[]);
        assert_eq!(css, "#g1 .hot { opacity: 0.5 }\n");
    }

    #[test]
    fn test_pseudo_class_and_id() {
        let css = cloned_css(
            "g1",
            MARKUP,
            &rules(&[(".node:hover", "fill: pink"), ("#a", "x: 1"), ("#zzz", "x: 2")]),
            &[],
        );
        assert!(css.contains(".node:hover"));
        assert!(css.contains("#g1 #a"));
        assert!(!css.contains("zzz"));
    }

    #[test]
    fn test_class_definitions_are_important() {
        let classes = [
            ClassDef::new("hot", vec!["fill:#f00".to_string(), "stroke:#333".to_string()]),
            ClassDef::new("default", vec!["fill:#eee".to_string()]),
            ClassDef::new("empty", Vec::new()),
        ];
        let css = cloned_css("g1", MARKUP, &[], &classes);

        assert!(css.contains("#g1 .hot > * { fill:#f00 !important; stroke:#333 !important; }"));
        assert!(css.contains("#g1 .node > * { fill:#eee !important; }"));
        assert!(!css.contains("empty"));
    }

    #[test]
    fn test_nothing_applies() {
        assert!(cloned_css("g1", MARKUP, &rules(&[("polygon", "fill: red")]), &[]).is_empty());
    }
}
