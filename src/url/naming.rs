use url::Url;

/// Category name used when a URL has no usable path segment
pub const DEFAULT_CATEGORY: &str = "main";

/// Returns the last non-empty path segment of a URL, ignoring query and fragment
///
/// Inputs that do not parse as absolute URLs are treated as bare paths.
pub fn last_segment(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    path.split('/')
        .rfind(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Derives a category name from a listing URL
///
/// # Examples
///
/// ```
/// use sale_pager::url::category_name;
///
/// assert_eq!(category_name("https://x.test/sale/shoes?ref=1"), "shoes");
/// assert_eq!(category_name("https://x.test/"), "main");
/// ```
pub fn category_name(url: &str) -> String {
    last_segment(url).unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

/// Makes a string safe to use as a file name component
///
/// ASCII alphanumerics, `-` and `_` are kept; everything else becomes `_`.
pub fn slugify(value: &str) -> String {
    let slug: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if slug.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        slug
    }
}

/// File-safe slug of a URL's host, with any `www.` prefix dropped
pub fn host_slug(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string());

    slugify(host.strip_prefix("www.").unwrap_or(&host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_name_strips_query() {
        assert_eq!(category_name("https://x.test/sale/shoes?ref=1"), "shoes");
    }

    #[test]
    fn test_category_name_ignores_trailing_slash() {
        assert_eq!(category_name("https://x.test/sale/bags/"), "bags");
        assert_eq!(category_name("https://x.test/sale//"), "sale");
    }

    #[test]
    fn test_category_name_defaults_to_main() {
        assert_eq!(category_name("https://x.test"), "main");
        assert_eq!(category_name("https://x.test/?page=2"), "main");
        assert_eq!(category_name(""), "main");
    }

    #[test]
    fn test_category_name_for_relative_input() {
        assert_eq!(category_name("sale/coats?x=1"), "coats");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("shoes"), "shoes");
        assert_eq!(slugify("Men's Sale"), "Men_s_Sale");
        assert_eq!(slugify("a/b?c"), "a_b_c");
        assert_eq!(slugify(""), "main");
    }

    #[test]
    fn test_host_slug() {
        assert_eq!(host_slug("https://www.ssense.com/en-us/sale"), "ssense_com");
        assert_eq!(host_slug("https://en.2ndstreet.jp/goods"), "en_2ndstreet_jp");
        assert_eq!(host_slug("not a url"), "unknown");
    }
}
