/// Builds the request URL for one page of a listing
///
/// Page 1 is the base URL unmodified. Later pages append the pagination
/// parameter, with `&` when the base URL already carries a query string and
/// `?` otherwise.
///
/// # Examples
///
/// ```
/// use sale_pager::url::page_url;
///
/// assert_eq!(page_url("https://x.test/sale", "page", 1), "https://x.test/sale");
/// assert_eq!(page_url("https://x.test/sale", "page", 2), "https://x.test/sale?page=2");
/// assert_eq!(page_url("https://x.test/sale?sort=new", "p", 3), "https://x.test/sale?sort=new&p=3");
/// ```
pub fn page_url(base_url: &str, param: &str, page: u32) -> String {
    if page <= 1 {
        return base_url.to_string();
    }

    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", base_url, separator, param, page)
}
