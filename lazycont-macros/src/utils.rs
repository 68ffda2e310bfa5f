use proc_macro::{TokenStream, TokenTree};

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Each argument is returned as a `Vec<TokenTree>`. Delimited groups
/// (`(..)`, `[..]`, `{..}`) arrive as single tokens, so only top-level commas
/// separate arguments. Commas inside generic arguments (`Cont::<(), u32>`)
/// are kept by tracking angle brackets; `->` and `=>` do not close one.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current: Vec<TokenTree> = Vec::new();
    let mut angles = 0usize;

    for token in input {
        if let TokenTree::Punct(p) = &token {
            match p.as_char() {
                ',' if angles == 0 => {
                    if !current.is_empty() {
                        args.push(current);
                        current = Vec::new();
                    }
                    continue;
                }
                '<' => angles += 1,
                '>' if !follows_arrow_head(&current) => angles = angles.saturating_sub(1),
                _ => {}
            }
        }

        current.push(token);
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Returns `true` if the last token is the `-` or `=` of an arrow.
fn follows_arrow_head(tokens: &[TokenTree]) -> bool {
    matches!(tokens.last(), Some(TokenTree::Punct(p)) if p.as_char() == '-' || p.as_char() == '=')
}

/// Converts a slice of tokens back into Rust source.
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    tokens.iter().cloned().collect::<TokenStream>().to_string()
}

/// Returns `true` if the tokens at position `i` form a `=>` arrow.
fn is_arrow(tokens: &[TokenTree], i: usize) -> bool {
    if i + 1 >= tokens.len() {
        return false;
    }

    matches!(
        (&tokens[i], &tokens[i + 1]),
        (TokenTree::Punct(p1), TokenTree::Punct(p2))
            if p1.as_char() == '=' && p2.as_char() == '>'
    )
}

/// Parses `select`-style branches of the form `cont_expr => handler_expr`.
///
/// The result is a list of `(cont, handler)` source strings. Returns an
/// error message naming the first malformed branch.
pub(crate) fn parse_select_branches(args: Vec<Vec<TokenTree>>) -> Result<Vec<(String, String)>, String> {
    let mut branches = Vec::new();

    for (index, tokens) in args.into_iter().enumerate() {
        let Some(arrow) = (0..tokens.len()).find(|&i| is_arrow(&tokens, i)) else {
            return Err(format!("select branch {} is missing `=>`", index + 1));
        };

        let cont = tokens_to_string(&tokens[..arrow]);
        let handler = tokens_to_string(&tokens[arrow + 2..]);

        if cont.trim().is_empty() || handler.trim().is_empty() {
            return Err(format!("select branch {} is incomplete", index + 1));
        }

        branches.push((cont, handler));
    }

    Ok(branches)
}

/// Parses generated source, or turns the failure into a `compile_error!`.
pub(crate) fn emit(source: String, macro_name: &str) -> TokenStream {
    match source.parse::<TokenStream>() {
        Ok(ts) => ts,
        Err(err) => compile_error(&format!("{macro_name} macro error: {err}")),
    }
}

/// Expands to `compile_error!(message)`.
pub(crate) fn compile_error(message: &str) -> TokenStream {
    format!("::core::compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
