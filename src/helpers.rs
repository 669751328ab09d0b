use fancy_regex::Regex;

/// Replace every match of `re` in `text` with `with`, returning the new text
/// and the number of replacements. A regex runtime error (backtrack limit)
/// ends the pass early; the remainder is kept as is.
pub(crate) fn replace_counted(re: &Regex, text: &str, with: &str) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut count = 0;

    for m in re.find_iter(text) {
        let Ok(m) = m else { break };
        if m.end() == m.start() {
            continue;
        }
        out.push_str(&text[last..m.start()]);
        out.push_str(with);
        last = m.end();
        count += 1;
    }
    out.push_str(&text[last..]);

    (out, count)
}

pub(crate) fn replace_all(re: &Regex, text: &str, with: &str) -> String {
    replace_counted(re, text, with).0
}

/// First match of `re` in `text`, absorbing runtime errors as a miss.
pub(crate) fn find_str<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.find(text).ok().flatten().map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_replacements() {
        let re = Regex::new(r"(?i)https?:[^);]*[);]?").unwrap();
        let (out, n) = replace_counted(&re, "Foo (+http://a.com; http://b.com)", " ");
        assert_eq!(n, 2);
        assert_eq!(out, "Foo (+   ");
    }

    #[test]
    fn no_match_keeps_text() {
        let re = Regex::new("zzz").unwrap();
        assert_eq!(replace_counted(&re, "abc", " "), ("abc".to_string(), 0));
        assert_eq!(find_str(&re, "abc"), None);
    }
}
