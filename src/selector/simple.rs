use std::fmt;

use crate::common::AttrMatcher;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimpleSelector {
    Universal,
    Type {
        name: String,
        namespace: Option<String>,
    },
    Class(String),
    Id(String),
    /// `%name` — usable as an `@extend` target, never emitted.
    Placeholder(String),
    /// `&` — illegal at the top level of a stylesheet; resolved away by
    /// the expander before any later pass sees it.
    Parent,
    Attribute {
        name: String,
        namespace: Option<String>,
        matcher: Option<AttrMatcher>,
        value: Option<String>,
    },
    Pseudo {
        name: String,
        is_element: bool,
        argument: Option<String>,
    },
}

impl SimpleSelector {
    /// Rank used only for subset-map key canonicalization (DESIGN.md
    /// Open Question 2): id > class > attribute > pseudo > placeholder
    /// > type/universal.
    pub fn sort_rank(&self) -> u8 {
        match self {
            SimpleSelector::Id(..) => 0,
            SimpleSelector::Class(..) => 1,
            SimpleSelector::Attribute { .. } => 2,
            SimpleSelector::Pseudo { .. } => 3,
            SimpleSelector::Placeholder(..) => 4,
            SimpleSelector::Type { .. } | SimpleSelector::Universal => 5,
            SimpleSelector::Parent => 6,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, SimpleSelector::Placeholder(..))
    }

    pub fn is_parent(&self) -> bool {
        matches!(self, SimpleSelector::Parent)
    }

    /// Normalized textual form used by subset-map matching (matching
    /// is done on normalized text, not structural equality).
    pub fn normalized(&self) -> String {
        format!("{}", self)
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimpleSelector::Universal => write!(f, "*"),
            SimpleSelector::Type { name, namespace } => {
                if let Some(ns) = namespace {
                    write!(f, "{}|{}", ns, name)
                } else {
                    write!(f, "{}", name)
                }
            }
            SimpleSelector::Class(name) => write!(f, ".{}", name),
            SimpleSelector::Id(name) => write!(f, "#{}", name),
            SimpleSelector::Placeholder(name) => write!(f, "%{}", name),
            SimpleSelector::Parent => write!(f, "&"),
            SimpleSelector::Attribute {
                name,
                namespace,
                matcher,
                value,
            } => {
                write!(f, "[")?;
                if let Some(ns) = namespace {
                    write!(f, "{}|", ns)?;
                }
                write!(f, "{}", name)?;
                if let (Some(m), Some(v)) = (matcher, value) {
                    write!(f, "{}\"{}\"", m, v)?;
                }
                write!(f, "]")
            }
            SimpleSelector::Pseudo {
                name,
                is_element,
                argument,
            } => {
                if *is_element {
                    write!(f, "::{}", name)?;
                } else {
                    write!(f, ":{}", name)?;
                }
                if let Some(arg) = argument {
                    write!(f, "({})", arg)?;
                }
                Ok(())
            }
        }
    }
}
