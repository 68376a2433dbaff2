//! Convenience macros.

/// Builds a [`Kwargs`](crate::Kwargs) map from named arguments.
///
/// Values go through `serde_json::json!`, so literals, expressions, and
/// nested JSON syntax all work:
///
/// ```rust
/// use solder_core::kwargs;
///
/// let kw = kwargs!(arg = 1, label = "x");
/// assert_eq!(kw["arg"], 1);
/// assert_eq!(kw["label"], "x");
/// ```
#[macro_export]
macro_rules! kwargs {
    () => {
        $crate::Kwargs::new()
    };
    ($($key:ident = $value:expr),+ $(,)?) => {{
        let mut map = $crate::Kwargs::new();
        $(
            map.insert(stringify!($key).to_owned(), $crate::__private::json!($value));
        )+
        map
    }};
}
