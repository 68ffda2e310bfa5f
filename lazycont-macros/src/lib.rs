//! Procedural macros for `lazycont`.
//!
//! - [`join!`] / [`join_with!`] run continuations of different value types
//!   and collect their values into a flat tuple.
//! - [`select!`] / [`select_with!`] race continuations, mapping each branch
//!   to a common type first.
//!
//! The expansions refer to the runtime crate as `::lazycont`.

mod utils;

use proc_macro::TokenStream;

const QUIT_FAST: &str = "::lazycont::Policy::QuitFast";

/// Joins continuations into a flat tuple of their values.
///
/// `join!(a, b, c)` builds `a.both(b.both(c, ..), ..)` under
/// `Policy::QuitFast` and flattens the nested pairs, so the result is a
/// `Cont<E, (A, B, C)>`. The first failure terminates the join and cancels
/// the other participants.
///
/// # Examples
///
/// ```rust,ignore
/// let user_and_orders = join!(load_user(id), load_orders(id));
/// ```
#[proc_macro]
pub fn join(input: TokenStream) -> TokenStream {
    let args = utils::split_args(input);
    let exprs: Vec<String> = args.iter().map(|a| utils::tokens_to_string(a)).collect();

    utils::emit(join_impl(QUIT_FAST, &exprs), "join")
}

/// Like [`join!`], with an explicit `BothPolicy` as first argument.
///
/// ```rust,ignore
/// let both = join_with!(BothPolicy::merge_errors(), check_a(), check_b());
/// ```
#[proc_macro]
pub fn join_with(input: TokenStream) -> TokenStream {
    let args = utils::split_args(input);

    let Some((policy, rest)) = args.split_first() else {
        return utils::compile_error("join_with! expects a policy followed by continuations");
    };

    let policy = utils::tokens_to_string(policy);
    let exprs: Vec<String> = rest.iter().map(|a| utils::tokens_to_string(a)).collect();

    utils::emit(join_impl(&policy, &exprs), "join_with")
}

fn join_impl(policy: &str, exprs: &[String]) -> String {
    let count = exprs.len();

    if count == 0 {
        return "::lazycont::Cont::of(())".to_owned();
    }

    let mut out = String::from("{\n");
    out.push_str(&format!("let __policy: ::lazycont::BothPolicy = {policy};\n"));

    for (i, expr) in exprs.iter().enumerate() {
        out.push_str(&format!("let __c{} = {expr};\n", i + 1));
    }

    if count == 1 {
        out.push_str("let _ = __policy;\n");
        out.push_str("__c1.map(|__v1| (__v1,))\n}\n");
        return out;
    }

    // Fold from the right: __j holds the tuple of values i+1..=n.
    out.push_str(&format!("let __j = __c{count};\n"));

    for i in (1..count).rev() {
        let tail = vars(i + 1, count);
        let right = if i + 1 == count {
            format!("__v{count}")
        } else {
            format!("({tail})")
        };

        out.push_str(&format!(
            "let __j = __c{i}.both(__j, |__v{i}, {right}| (__v{i}, {tail}), \
             ::std::clone::Clone::clone(&__policy));\n"
        ));
    }

    out.push_str("__j\n}\n");
    out
}

/// `__v{from}, ..., __v{to}`.
fn vars(from: usize, to: usize) -> String {
    (from..=to)
        .map(|i| format!("__v{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Races continuations, mapping each branch's value with its handler.
///
/// `select! { a => |x| .., b => |y| .. }` maps every branch to a common type
/// and settles with the first success under `Policy::QuitFast`, cancelling
/// the other branches. If every branch fails, the errors of all branches
/// are reported.
///
/// # Examples
///
/// ```rust,ignore
/// let first = select! {
///     from_cache(key) => |hit| Source::Cache(hit),
///     from_db(key) => |row| Source::Db(row),
/// };
/// ```
#[proc_macro]
pub fn select(input: TokenStream) -> TokenStream {
    let args = utils::split_args(input);

    match utils::parse_select_branches(args) {
        Ok(branches) => utils::emit(select_impl(QUIT_FAST, &branches), "select"),
        Err(message) => utils::compile_error(&message),
    }
}

/// Like [`select!`], with an explicit `EitherPolicy` as first argument.
#[proc_macro]
pub fn select_with(input: TokenStream) -> TokenStream {
    let mut args = utils::split_args(input);

    if args.is_empty() {
        return utils::compile_error("select_with! expects a policy followed by branches");
    }

    let policy = utils::tokens_to_string(&args.remove(0));

    match utils::parse_select_branches(args) {
        Ok(branches) => utils::emit(select_impl(&policy, &branches), "select_with"),
        Err(message) => utils::compile_error(&message),
    }
}

fn select_impl(policy: &str, branches: &[(String, String)]) -> String {
    let mapped = branches
        .iter()
        .map(|(cont, handler)| format!("({cont}).map({handler})"))
        .collect::<Vec<_>>()
        .join(",\n");

    format!("::lazycont::Cont::any(::std::vec![{mapped}], {policy})")
}
