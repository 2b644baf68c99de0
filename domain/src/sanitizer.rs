/// Strip backticks and turn typographic single quotes into ASCII apostrophes.
///
/// Every other character passes through untouched; the result is not checked for valid SQL.
pub fn sanitize_sql(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '`')
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}
