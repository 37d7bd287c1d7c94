//! Theme and code palette rule tables.
//!
//! A selector is either a tag name or `.class`. `{accent}` in a declaration
//! block is replaced by the active accent color.

pub(crate) type Rules = &'static [(&'static str, &'static str)];

pub(crate) const DEFAULT_STYLE: Rules = &[
    ("h1", "display:table;margin:2em auto 1em;padding:0 1em;border-bottom:2px solid {accent};font-size:1.4em;font-weight:bold;text-align:center;color:#3f3f3f;"),
    ("h2", "display:table;margin:4em auto 2em;padding:0 0.2em;background:{accent};color:#fff;font-size:1.2em;font-weight:bold;text-align:center;"),
    ("h3", "margin:2em 8px 0.75em 0;padding-left:8px;border-left:3px solid {accent};font-size:1.1em;font-weight:bold;color:#3f3f3f;"),
    ("h4", "margin:2em 8px 0.5em;font-size:1em;font-weight:bold;color:{accent};"),
    ("h5", "margin:1.5em 8px 0.5em;font-size:1em;font-weight:bold;color:{accent};"),
    ("h6", "margin:1.5em 8px 0.5em;font-size:1em;color:{accent};"),
    ("p", "margin:1.5em 8px;letter-spacing:0.1em;color:#3f3f3f;line-height:1.75;font-size:15px;"),
    ("blockquote", "margin:0 0 1em;padding:1em;border-left:4px solid {accent};border-radius:6px;background:#f7f7f7;color:rgba(0,0,0,0.6);"),
    ("pre", "margin:10px 8px;font-size:90%;overflow-x:auto;border-radius:8px;line-height:1.5;"),
    ("code", "font-size:90%;color:#d14;background:rgba(27,31,35,0.05);padding:3px 5px;border-radius:4px;"),
    ("a", "color:#576b95;text-decoration:none;"),
    ("strong", "color:{accent};font-weight:bold;"),
    ("em", "font-style:italic;"),
    ("ul", "margin-left:0;padding-left:1em;list-style:circle;color:#3f3f3f;"),
    ("ol", "margin-left:0;padding-left:1em;color:#3f3f3f;"),
    ("li", "margin:0.2em 8px;"),
    ("table", "border-collapse:collapse;text-align:center;margin:1em 8px;color:#3f3f3f;"),
    ("th", "border:1px solid #dfdfdf;padding:0.25em 0.5em;background:rgba(0,0,0,0.05);font-weight:bold;"),
    ("td", "border:1px solid #dfdfdf;padding:0.25em 0.5em;"),
    ("hr", "border:0;border-top:1px solid rgba(0,0,0,0.1);margin:1.5em 0;"),
    (".image-figure", "margin:1.5em 8px;"),
    (".image-caption", "text-align:center;color:#888;font-size:0.8em;"),
    (".footnote-ref", "color:{accent};font-size:80%;"),
    (".footnotes-title", "margin:2em 8px 0.5em;font-size:1em;color:{accent};"),
    (".footnote-item", "margin:0.5em 8px;font-size:80%;color:#3f3f3f;"),
    (".alert-title", "font-weight:bold;color:{accent};"),
];

pub(crate) const ELEGANT_STYLE: Rules = &[
    ("h1", "margin:2em 0 1em;font-size:1.5em;font-weight:normal;text-align:center;color:{accent};letter-spacing:0.1em;"),
    ("h2", "margin:3em 0 1.5em;padding-bottom:0.3em;border-bottom:1px solid {accent};font-size:1.25em;font-weight:normal;color:{accent};"),
    ("h3", "margin:2em 0 0.75em;font-size:1.1em;font-weight:bold;color:#333;"),
    ("h4", "margin:1.5em 0 0.5em;font-size:1em;font-weight:bold;color:#555;"),
    ("p", "margin:1.25em 0;color:#333;line-height:1.9;font-size:15px;text-align:justify;"),
    ("blockquote", "margin:1.5em 0;padding:0.5em 1.25em;border-left:2px solid {accent};color:#666;font-style:italic;"),
    ("pre", "margin:1.25em 0;font-size:85%;overflow-x:auto;border-radius:4px;line-height:1.6;"),
    ("code", "font-size:90%;color:{accent};padding:0 2px;"),
    ("a", "color:{accent};text-decoration:none;border-bottom:1px dashed {accent};"),
    ("strong", "color:#111;font-weight:bold;"),
    ("ul", "padding-left:1.25em;color:#333;"),
    ("ol", "padding-left:1.25em;color:#333;"),
    ("li", "margin:0.3em 0;"),
    ("table", "border-collapse:collapse;margin:1.25em 0;color:#333;"),
    ("th", "border-bottom:2px solid {accent};padding:0.4em 0.75em;"),
    ("td", "border-bottom:1px solid #eee;padding:0.4em 0.75em;"),
    ("hr", "border:0;border-top:1px dashed #ccc;margin:2em 0;"),
    (".image-caption", "text-align:center;color:#999;font-size:0.8em;font-style:italic;"),
    (".footnote-ref", "color:{accent};font-size:75%;"),
    (".footnote-item", "margin:0.4em 0;font-size:80%;color:#666;"),
];

pub(crate) const GITHUB_PALETTE: Rules = &[
    (".hljs", "display:block;padding:0.5em 1em;color:#24292e;background:#f6f8fa;"),
    (".hljs-comment", "color:#6a737d;font-style:italic;"),
    (".hljs-keyword", "color:#d73a49;"),
    (".hljs-string", "color:#032f62;"),
    (".hljs-number", "color:#005cc5;"),
    (".hljs-literal", "color:#005cc5;"),
    (".hljs-title", "color:#6f42c1;"),
    (".hljs-type", "color:#e36209;"),
    (".line-number", "display:inline-block;width:2em;margin-right:1em;color:#959da5;text-align:right;"),
];

pub(crate) const MONOKAI_PALETTE: Rules = &[
    (".hljs", "display:block;padding:0.5em 1em;color:#f8f8f2;background:#272822;"),
    (".hljs-comment", "color:#75715e;"),
    (".hljs-keyword", "color:#f92672;"),
    (".hljs-string", "color:#e6db74;"),
    (".hljs-number", "color:#ae81ff;"),
    (".hljs-literal", "color:#ae81ff;"),
    (".hljs-title", "color:#a6e22e;"),
    (".hljs-type", "color:#66d9ef;font-style:italic;"),
    (".line-number", "display:inline-block;width:2em;margin-right:1em;color:#75715e;text-align:right;"),
];

pub(crate) const ATOM_ONE_DARK_PALETTE: Rules = &[
    (".hljs", "display:block;padding:0.5em 1em;color:#abb2bf;background:#282c34;"),
    (".hljs-comment", "color:#5c6370;font-style:italic;"),
    (".hljs-keyword", "color:#c678dd;"),
    (".hljs-string", "color:#98c379;"),
    (".hljs-number", "color:#d19a66;"),
    (".hljs-literal", "color:#56b6c2;"),
    (".hljs-title", "color:#61aeee;"),
    (".hljs-type", "color:#e6c07b;"),
    (".line-number", "display:inline-block;width:2em;margin-right:1em;color:#5c6370;text-align:right;"),
];

/// Rules for theme `name`, if known.
pub(crate) fn theme(name: &str) -> Option<Rules> {
    match name {
        "default" => Some(DEFAULT_STYLE),
        "elegant" => Some(ELEGANT_STYLE),
        _ => None,
    }
}

/// Code palette for highlight style `name`, if known.
pub(crate) fn palette(name: &str) -> Option<Rules> {
    match name {
        "github" => Some(GITHUB_PALETTE),
        "monokai" => Some(MONOKAI_PALETTE),
        "atom-one-dark" => Some(ATOM_ONE_DARK_PALETTE),
        _ => None,
    }
}
