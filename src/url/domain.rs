use url::Url;

/// Checks whether two URLs belong to the same site
///
/// Two URLs are the same site when both the scheme and the hostname match.
/// `http` and `https` count as different sites; the port is not compared.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitemapper::url::same_site;
///
/// let a = Url::parse("https://example.com/a").unwrap();
/// let b = Url::parse("https://EXAMPLE.com/b?q=1").unwrap();
/// let c = Url::parse("http://example.com/a").unwrap();
/// assert!(same_site(&a, &b));
/// assert!(!same_site(&a, &c));
/// ```
pub fn same_site(url: &Url, base: &Url) -> bool {
    url.scheme() == base.scheme() && url.host_str() == base.host_str()
}
