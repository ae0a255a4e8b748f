//! Page request parsing and pagination response headers
//!
//! Requests use `page` (zero-based), `size` and repeated
//! `sort=property[,property...][,asc|desc]` parameters. Responses carry
//! `X-Total-Count` and an RFC 5988 `Link` header.

use axum::http::{HeaderMap, HeaderName, HeaderValue, Uri};

use crate::config::PaginationConfig;
use crate::error::AppError;
use crate::services::paging::{Direction, Page, Pageable, SortOrder, SortProperty};

pub const X_TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");

fn parse_index(name: &str, value: &str) -> Result<usize, AppError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| AppError::InvalidInput(format!("'{}' must be a non-negative integer, got '{}'", name, value)))
}

fn parse_sort(value: &str, sort: &mut Vec<SortOrder>) -> Result<(), AppError> {
    let parts: Vec<&str> = value.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
    let Some((last, init)) = parts.split_last() else {
        return Ok(());
    };

    let (properties, direction) = match last.parse::<Direction>() {
        Ok(direction) if !init.is_empty() => (init, direction),
        _ => (parts.as_slice(), Direction::Asc),
    };

    for property in properties {
        let property = property.parse::<SortProperty>().map_err(AppError::InvalidInput)?;
        sort.push(SortOrder { property, direction });
    }
    Ok(())
}

/// Build a page request from raw query parameters.
///
/// Sizes above the configured maximum are capped; a size of zero, a
/// non-numeric index or an unknown sort property is rejected.
pub fn pageable_from_params(
    params: &[(String, String)],
    config: &PaginationConfig,
) -> Result<Pageable, AppError> {
    let mut page = 0;
    let mut size = config.default_page_size;
    let mut sort = Vec::new();

    for (name, value) in params {
        match name.as_str() {
            "page" => page = parse_index("page", value)?,
            "size" => {
                size = parse_index("size", value)?;
                if size == 0 {
                    return Err(AppError::InvalidInput("'size' must be at least 1".to_string()));
                }
            }
            "sort" => parse_sort(value, &mut sort)?,
            _ => {}
        }
    }

    let mut pageable = Pageable::new(page, size.min(config.max_page_size));
    pageable.sort = sort;
    Ok(pageable)
}

fn page_link(uri: &Uri, page: usize, size: usize, rel: &str) -> String {
    let mut query = vec![format!("page={}", page), format!("size={}", size)];
    query.extend(
        uri.query()
            .unwrap_or_default()
            .split('&')
            .filter(|p| !p.is_empty() && !p.starts_with("page=") && !p.starts_with("size="))
            .map(str::to_string),
    );

    format!("<{}?{}>; rel=\"{}\"", uri.path(), query.join("&"), rel)
}

/// `X-Total-Count` plus `Link` with next, prev, last and first relations
pub fn pagination_headers<T>(uri: &Uri, page: &Page<T>) -> HeaderMap {
    let mut links = Vec::with_capacity(4);
    if page.has_next() {
        links.push(page_link(uri, page.page.saturating_add(1), page.size, "next"));
    }
    if page.has_previous() {
        links.push(page_link(uri, page.page - 1, page.size, "prev"));
    }
    let last_page = page.total_pages().saturating_sub(1);
    links.push(page_link(uri, last_page, page.size, "last"));
    links.push(page_link(uri, 0, page.size, "first"));

    let mut headers = HeaderMap::new();
    headers.insert(X_TOTAL_COUNT, HeaderValue::from(page.total));
    match HeaderValue::from_str(&links.join(",")) {
        Ok(value) => {
            headers.insert(axum::http::header::LINK, value);
        }
        Err(e) => tracing::warn!(error = %e, "Skipping unencodable Link header"),
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn config() -> PaginationConfig {
        PaginationConfig { default_page_size: 20, max_page_size: 50 }
    }

    #[test]
    fn test_defaults() {
        let pageable = pageable_from_params(&[], &config()).unwrap();
        assert_eq!(pageable, Pageable::new(0, 20));
    }

    #[test]
    fn test_page_size_and_sort() {
        let pageable = pageable_from_params(
            &params(&[("page", "2"), ("size", "5"), ("sort", "id,desc"), ("sort", "text")]),
            &config(),
        )
        .unwrap();

        assert_eq!(pageable.page, 2);
        assert_eq!(pageable.size, 5);
        assert_eq!(
            pageable.sort,
            vec![SortOrder::desc(SortProperty::Id), SortOrder::asc(SortProperty::Text)]
        );
    }

    #[test]
    fn test_direction_applies_to_every_listed_property() {
        let pageable =
            pageable_from_params(&params(&[("sort", "creationDate,text,DESC")]), &config()).unwrap();

        assert_eq!(
            pageable.sort,
            vec![SortOrder::desc(SortProperty::CreationDate), SortOrder::desc(SortProperty::Text)]
        );
    }

    #[test]
    fn test_size_is_capped() {
        let pageable = pageable_from_params(&params(&[("size", "5000")]), &config()).unwrap();
        assert_eq!(pageable.size, 50);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        for pairs in [
            [("sort", "author,asc")],
            [("page", "-1")],
            [("size", "abc")],
            [("size", "0")],
        ] {
            let err = pageable_from_params(&params(&pairs), &config()).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)), "{:?} should be rejected", pairs);
        }
    }

    #[test]
    fn test_unrelated_parameters_ignored() {
        let pageable = pageable_from_params(&params(&[("query", "id:1"), ("sort", "")]), &config()).unwrap();
        assert!(pageable.sort.is_empty());
    }

    #[test]
    fn test_link_header_middle_page() {
        let uri: Uri = "/api/comments?page=1&size=2&sort=id,desc".parse().unwrap();
        let page = Page { content: vec![(); 2], total: 5, page: 1, size: 2 };

        let headers = pagination_headers(&uri, &page);
        assert_eq!(headers.get("X-Total-Count").unwrap(), "5");
        assert_eq!(
            headers.get("link").unwrap(),
            "</api/comments?page=2&size=2&sort=id,desc>; rel=\"next\",\
             </api/comments?page=0&size=2&sort=id,desc>; rel=\"prev\",\
             </api/comments?page=2&size=2&sort=id,desc>; rel=\"last\",\
             </api/comments?page=0&size=2&sort=id,desc>; rel=\"first\""
        );
    }

    #[test]
    fn test_link_header_empty_result() {
        let uri: Uri = "/api/_search/comments?query=nothing".parse().unwrap();
        let page: Page<()> = Page { content: vec![], total: 0, page: 0, size: 20 };

        let headers = pagination_headers(&uri, &page);
        let link = headers.get("link").unwrap().to_str().unwrap();
        assert_eq!(headers.get("x-total-count").unwrap(), "0");
        assert!(!link.contains("rel=\"next\""));
        assert!(!link.contains("rel=\"prev\""));
        assert!(link.contains("</api/_search/comments?page=0&size=20&query=nothing>; rel=\"last\""));
    }

    #[test]
    fn test_link_header_largest_page_index() {
        let uri: Uri = format!("/api/comments?page={}", usize::MAX).parse().unwrap();
        let page = Page { content: Vec::<()>::new(), total: 1, page: usize::MAX, size: 20 };

        let headers = pagination_headers(&uri, &page);
        let link = headers.get("link").unwrap().to_str().unwrap();
        assert!(!link.contains("rel=\"next\""));
        assert!(link.contains(&format!("</api/comments?page={}&size=20>; rel=\"prev\"", usize::MAX - 1)));
        assert!(link.contains("</api/comments?page=0&size=20>; rel=\"last\""));
    }
}
