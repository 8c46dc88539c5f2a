//! Escaping for the engine's filter syntax.
//!
//! Free text passes through two parsers: the filter option parser (splits on
//! `:`) and the filtergraph parser (splits on `,` `;` and brackets). Text is
//! escaped for the option level first, then for the graph level.

/// Escape a value for the filter option parser.
///
/// `%` is escaped as well because drawtext expands `%{...}` sequences.
pub fn option_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '\'' | ':' | '%') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape an already option-escaped string for the filtergraph parser.
pub fn graph_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape free text (drawtext text, font paths, colours) for embedding as a
/// filter option value inside a filter graph.
pub fn text(s: &str) -> String {
    graph_value(&option_value(s))
}

/// Wrap an expression in single quotes so commas and colons inside it are
/// not treated as separators.
///
/// Expressions never contain quotes themselves; any that do are dropped.
pub fn expr(e: &str) -> String {
    format!("'{}'", e.replace('\'', ""))
}

/// Time-window predicate for the `enable` option.
pub fn between(start: f64, end: f64) -> String {
    expr(&format!("between(t,{start},{end})"))
}

/// Open-ended predicate for the `enable` option: on from `start` onwards.
pub fn since(start: f64) -> String {
    expr(&format!("gte(t,{start})"))
}
