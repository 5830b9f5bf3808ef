use serde::Deserialize;

pub const DEFAULT_LIMIT: usize = 6;
pub const MAX_LIMIT: usize = 50;

/// Raw `?page=&limit=` parameters. Kept as strings so that garbage falls
/// back to the defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    /// Clamps to `page >= 1` and `1 <= limit <= MAX_LIMIT`; this is the only
    /// place listing parameters are validated.
    pub fn normalize(&self) -> (usize, usize) {
        let page = parse_number(self.page.as_deref())
            .filter(|&page| page >= 1)
            .unwrap_or(1);

        let limit = parse_number(self.limit.as_deref())
            .filter(|limit| (1..=MAX_LIMIT).contains(limit))
            .unwrap_or(DEFAULT_LIMIT);

        (page, limit)
    }
}

fn parse_number(raw: Option<&str>) -> Option<usize> {
    raw?.trim().parse::<i64>().ok().and_then(|n| usize::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> ListQuery {
        ListQuery {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ListQuery::default().normalize(), (1, DEFAULT_LIMIT));
    }

    #[test]
    fn test_valid_values_pass_through() {
        assert_eq!(query(Some("3"), Some("10")).normalize(), (3, 10));
        assert_eq!(query(Some("1"), Some("50")).normalize(), (1, 50));
    }

    #[test]
    fn test_out_of_range_values_fall_back() {
        assert_eq!(query(Some("0"), Some("0")).normalize(), (1, DEFAULT_LIMIT));
        assert_eq!(query(Some("-4"), Some("51")).normalize(), (1, DEFAULT_LIMIT));
        assert_eq!(query(Some("abc"), Some("1e3")).normalize(), (1, DEFAULT_LIMIT));
        assert_eq!(query(Some(""), Some("")).normalize(), (1, DEFAULT_LIMIT));
    }
}
