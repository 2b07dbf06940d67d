//! Per-language markup rules.
//!
//! Everything the tree builder, tokenizers, and formatter need to know about
//! a markup language lives in one [`MarkupRules`] value. Supporting another
//! language means adding a table, not new control flow.

use std::borrow::Cow;

/// One optional-end-tag rule: opening `tag` implicitly ends the nearest open
/// element named in `closes`, unless one of `barriers` is met first when
/// walking the open-element stack from the innermost entry outwards.
#[derive(Debug, Clone, Copy)]
pub struct ImplicitClose {
    pub tag: &'static str,
    pub closes: &'static [&'static str],
    pub barriers: &'static [&'static str],
}

/// Attributes whose values are whitespace-separated token lists on a given
/// tag. `tag == "*"` applies to every tag.
#[derive(Debug, Clone, Copy)]
pub struct MultiValued {
    pub tag: &'static str,
    pub attributes: &'static [&'static str],
}

/// The rules table for one markup language.
#[derive(Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct MarkupRules {
    /// Short language name, e.g. `"html"`.
    pub name: &'static str,
    /// Lower-case tag and attribute names (and compare them that way).
    pub fold_case: bool,
    /// Elements that can never have children.
    pub void_elements: &'static [&'static str],
    /// Optional-end-tag rules.
    pub implicit_closes: &'static [ImplicitClose],
    /// Elements whose content is not markup and is written back unescaped.
    pub raw_text_elements: &'static [&'static str],
    /// Elements inside which whitespace is kept and never reformatted.
    pub preserve_whitespace: &'static [&'static str],
    pub multi_valued: &'static [MultiValued],
    /// Collapse whitespace-only strings to a single space or newline.
    pub collapse_whitespace: bool,
    /// Write any childless element as `<x/>`.
    pub self_closing_empty: bool,
    /// What ends a processing instruction: `>` in HTML, `?>` in XML.
    pub pi_terminator: &'static str,
}

impl MarkupRules {
    /// Folds a name according to `fold_case`.
    pub fn fold<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self.fold_case && name.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Owned(name.to_ascii_lowercase())
        } else {
            Cow::Borrowed(name)
        }
    }

    pub fn is_void(&self, name: &str) -> bool {
        self.void_elements.contains(&name)
    }

    pub fn is_raw_text(&self, name: &str) -> bool {
        self.raw_text_elements.contains(&name)
    }

    pub fn preserves_whitespace(&self, name: &str) -> bool {
        self.preserve_whitespace.contains(&name)
    }

    /// Returns `true` if `attribute` on `tag` holds a token list.
    pub fn is_multi_valued(&self, tag: &str, attribute: &str) -> bool {
        self.multi_valued
            .iter()
            .any(|rule| (rule.tag == "*" || rule.tag == tag) && rule.attributes.contains(&attribute))
    }

    /// Returns the implicit-close rule triggered by opening `tag`, if any.
    pub fn implicit_close(&self, tag: &str) -> Option<&ImplicitClose> {
        self.implicit_closes.iter().find(|rule| rule.tag == tag)
    }
}

const TABLE_SECTIONS: &[&str] = &["thead", "tbody", "tfoot"];
const CELLS: &[&str] = &["td", "th"];
const DEFINITION_ITEMS: &[&str] = &["dt", "dd"];
const CELL_BARRIERS: &[&str] = &["tr", "table", "thead", "tbody", "tfoot"];
const ROW_BARRIERS: &[&str] = &["table", "thead", "tbody", "tfoot"];
const PARAGRAPH_BARRIERS: &[&str] = &[
    "div",
    "table",
    "td",
    "th",
    "li",
    "dd",
    "dt",
    "blockquote",
    "section",
    "article",
    "aside",
    "header",
    "footer",
    "nav",
    "main",
    "body",
    "button",
    "form",
    "fieldset",
];

/// HTML: case-insensitive, with the usual void and optional-end-tag rules.
pub static HTML_RULES: MarkupRules = MarkupRules {
    name: "html",
    fold_case: true,
    void_elements: &[
        "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "menuitem",
        "meta", "param", "source", "track", "wbr", "basefont", "bgsound", "command", "frame",
        "image", "isindex", "nextid", "spacer",
    ],
    implicit_closes: &[
        ImplicitClose {
            tag: "p",
            closes: &["p"],
            barriers: PARAGRAPH_BARRIERS,
        },
        ImplicitClose {
            tag: "li",
            closes: &["li"],
            barriers: &["ul", "ol", "menu"],
        },
        ImplicitClose {
            tag: "dt",
            closes: DEFINITION_ITEMS,
            barriers: &["dl"],
        },
        ImplicitClose {
            tag: "dd",
            closes: DEFINITION_ITEMS,
            barriers: &["dl"],
        },
        ImplicitClose {
            tag: "tr",
            closes: &["tr"],
            barriers: ROW_BARRIERS,
        },
        ImplicitClose {
            tag: "td",
            closes: CELLS,
            barriers: CELL_BARRIERS,
        },
        ImplicitClose {
            tag: "th",
            closes: CELLS,
            barriers: CELL_BARRIERS,
        },
        ImplicitClose {
            tag: "thead",
            closes: TABLE_SECTIONS,
            barriers: &["table"],
        },
        ImplicitClose {
            tag: "tbody",
            closes: TABLE_SECTIONS,
            barriers: &["table"],
        },
        ImplicitClose {
            tag: "tfoot",
            closes: TABLE_SECTIONS,
            barriers: &["table"],
        },
        ImplicitClose {
            tag: "option",
            closes: &["option"],
            barriers: &["select", "datalist", "optgroup"],
        },
        ImplicitClose {
            tag: "optgroup",
            closes: &["optgroup"],
            barriers: &["select"],
        },
    ],
    raw_text_elements: &["script", "style"],
    preserve_whitespace: &["pre", "textarea"],
    multi_valued: &[
        MultiValued {
            tag: "*",
            attributes: &["class", "accesskey", "dropzone"],
        },
        MultiValued {
            tag: "a",
            attributes: &["rel", "rev"],
        },
        MultiValued {
            tag: "link",
            attributes: &["rel", "rev"],
        },
        MultiValued {
            tag: "td",
            attributes: &["headers"],
        },
        MultiValued {
            tag: "th",
            attributes: &["headers"],
        },
        MultiValued {
            tag: "form",
            attributes: &["accept-charset"],
        },
        MultiValued {
            tag: "object",
            attributes: &["archive"],
        },
        MultiValued {
            tag: "area",
            attributes: &["rel"],
        },
        MultiValued {
            tag: "icon",
            attributes: &["sizes"],
        },
        MultiValued {
            tag: "iframe",
            attributes: &["sandbox"],
        },
        MultiValued {
            tag: "output",
            attributes: &["for"],
        },
    ],
    collapse_whitespace: true,
    self_closing_empty: false,
    pi_terminator: ">",
};

/// XML: case-sensitive, no void or optional-end-tag rules.
pub static XML_RULES: MarkupRules = MarkupRules {
    name: "xml",
    fold_case: false,
    void_elements: &[],
    implicit_closes: &[],
    raw_text_elements: &[],
    preserve_whitespace: &[],
    multi_valued: &[],
    collapse_whitespace: true,
    self_closing_empty: true,
    pi_terminator: "?>",
};
