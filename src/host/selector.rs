//! A small CSS selector matcher: comma lists of compound selectors
//! (`tag`, `.class`, `#id`, `*`) joined by descendant or `>` combinators.

use crate::error::{MotionError, Result};
use crate::host::ElementId;

/// The questions the matcher needs answered about an element.
pub trait SelectorSubject {
    fn tag(&self, element: ElementId) -> Option<&str>;
    fn element_id(&self, element: ElementId) -> Option<&str>;
    fn has_class(&self, element: ElementId, class: &str) -> bool;
    fn parent(&self, element: ElementId) -> Option<ElementId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn matches<S: SelectorSubject + ?Sized>(&self, subject: &S, element: ElementId) -> bool {
        if let Some(tag) = &self.tag {
            if !subject
                .tag(element)
                .is_some_and(|t| t.eq_ignore_ascii_case(tag))
            {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if subject.element_id(element) != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| subject.has_class(element, c))
    }
}

/// One comma-separated alternative; parts run left to right and each part
/// after the first records how it relates to the part before it.
#[derive(Debug, Clone, PartialEq)]
struct Complex {
    parts: Vec<(Combinator, Compound)>,
}

impl Complex {
    fn matches<S: SelectorSubject + ?Sized>(&self, subject: &S, element: ElementId) -> bool {
        self.matches_at(subject, self.parts.len() - 1, element)
    }

    fn matches_at<S: SelectorSubject + ?Sized>(
        &self,
        subject: &S,
        index: usize,
        element: ElementId,
    ) -> bool {
        let (combinator, compound) = &self.parts[index];
        if !compound.matches(subject, element) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match combinator {
            Combinator::Child => subject
                .parent(element)
                .is_some_and(|parent| self.matches_at(subject, index - 1, parent)),
            Combinator::Descendant => {
                let mut ancestor = subject.parent(element);
                while let Some(current) = ancestor {
                    if self.matches_at(subject, index - 1, current) {
                        return true;
                    }
                    ancestor = subject.parent(current);
                }
                false
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || MotionError::Selector(input.to_string());

        let alternatives = input
            .split(',')
            .map(|alt| parse_complex(alt.trim()).ok_or_else(invalid))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { alternatives })
    }

    pub fn matches<S: SelectorSubject + ?Sized>(&self, subject: &S, element: ElementId) -> bool {
        self.alternatives.iter().any(|c| c.matches(subject, element))
    }
}

fn parse_complex(input: &str) -> Option<Complex> {
    if input.is_empty() {
        return None;
    }

    let mut parts = Vec::new();
    let mut pending = Combinator::Descendant;
    let mut saw_child = false;
    let mut token = String::new();

    let mut flush = |token: &mut String, pending: &mut Combinator, parts: &mut Vec<_>| -> Option<()> {
        if token.is_empty() {
            return Some(());
        }
        let compound = parse_compound(token)?;
        parts.push((*pending, compound));
        *pending = Combinator::Descendant;
        token.clear();
        Some(())
    };

    for ch in input.chars() {
        match ch {
            '>' => {
                flush(&mut token, &mut pending, &mut parts)?;
                if parts.is_empty() || saw_child {
                    return None;
                }
                pending = Combinator::Child;
                saw_child = true;
            }
            c if c.is_whitespace() => {
                flush(&mut token, &mut pending, &mut parts)?;
            }
            c => {
                token.push(c);
                saw_child = false;
            }
        }
    }
    flush(&mut token, &mut pending, &mut parts)?;

    if parts.is_empty() || saw_child {
        return None;
    }
    Some(Complex { parts })
}

fn parse_compound(token: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut rest = token;

    if let Some(stripped) = rest.strip_prefix('*') {
        rest = stripped;
    } else {
        let end = rest.find(['.', '#']).unwrap_or(rest.len());
        if end > 0 {
            compound.tag = Some(valid_name(&rest[..end])?.to_string());
        }
        rest = &rest[end..];
    }

    while !rest.is_empty() {
        let marker = rest.chars().next()?;
        if marker != '.' && marker != '#' {
            return None;
        }
        let body = &rest[1..];
        let end = body.find(['.', '#']).unwrap_or(body.len());
        let name = valid_name(&body[..end])?.to_string();
        match marker {
            '.' => compound.classes.push(name),
            '#' => {
                if compound.id.is_some() {
                    return None;
                }
                compound.id = Some(name);
            }
            _ => return None,
        }
        rest = &body[end..];
    }

    Some(compound)
}

fn valid_name(name: &str) -> Option<&str> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    ok.then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Tree {
        nodes: HashMap<u64, (&'static str, Option<&'static str>, Vec<&'static str>, Option<u64>)>,
    }

    impl SelectorSubject for Tree {
        fn tag(&self, element: ElementId) -> Option<&str> {
            self.nodes.get(&element.0).map(|n| n.0)
        }
        fn element_id(&self, element: ElementId) -> Option<&str> {
            self.nodes.get(&element.0).and_then(|n| n.1)
        }
        fn has_class(&self, element: ElementId, class: &str) -> bool {
            self.nodes
                .get(&element.0)
                .is_some_and(|n| n.2.contains(&class))
        }
        fn parent(&self, element: ElementId) -> Option<ElementId> {
            self.nodes.get(&element.0).and_then(|n| n.3).map(ElementId)
        }
    }

    fn tree() -> Tree {
        let mut nodes = HashMap::new();
        nodes.insert(1, ("main", Some("app"), vec!["page-content"], None));
        nodes.insert(2, ("section", None, vec!["hero"], Some(1)));
        nodes.insert(3, ("h1", None, vec!["title", "big"], Some(2)));
        nodes.insert(4, ("div", None, vec!["card"], Some(1)));
        Tree { nodes }
    }

    fn matches(selector: &str, id: u64) -> bool {
        Selector::parse(selector).unwrap().matches(&tree(), ElementId(id))
    }

    #[test]
    fn test_simple_selectors() {
        assert!(matches(".title", 3));
        assert!(matches("h1.title.big", 3));
        assert!(!matches("h1.title.small", 3));
        assert!(matches("#app", 1));
        assert!(matches("*", 4));
        assert!(matches("DIV", 4));
    }

    #[test]
    fn test_combinators() {
        assert!(matches(".page-content > *", 2));
        assert!(matches(".page-content > *", 4));
        assert!(!matches(".page-content > *", 3));
        assert!(!matches(".page-content > *", 1));
        assert!(matches(".page-content .title", 3));
        assert!(matches("#app>.hero>h1", 3));
    }

    #[test]
    fn test_selector_lists() {
        assert!(matches(".card, .title", 3));
        assert!(matches(".card, .title", 4));
        assert!(!matches(".card, .title", 2));
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("> .a").is_err());
        assert!(Selector::parse(".a >").is_err());
        assert!(Selector::parse(".a > > .b").is_err());
        assert!(Selector::parse(".a,").is_err());
        assert!(Selector::parse("div[data-x]").is_err());
    }

    #[test]
    fn test_non_ascii_selectors_are_rejected() {
        for input in ["*é", ".aé", "é", "div.карта", "#app>*ü", ".a é"] {
            assert_eq!(
                Selector::parse(input),
                Err(MotionError::Selector(input.to_string())),
                "{input}"
            );
        }
    }
}
