use reqwest::Url;

pub const ACCOUNT_PARAM: &str = "accountId";
const LOCATION_BASE: &str = "app://player-profile/";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub account_id: Option<String>,
}

impl Location {
    pub fn for_account(account_id: &str) -> Self {
        let trimmed = account_id.trim();
        Self {
            account_id: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        }
    }

    /// Accepts `?accountId=X`, `accountId=X&...`, a full URL with that query, or a bare id.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::default();
        }
        let query = raw.split_once('?').map(|(_, q)| q).unwrap_or(raw);
        if !query.contains('=') {
            return Self::for_account(raw);
        }
        let Ok(url) = Url::parse(&format!("{LOCATION_BASE}?{query}")) else {
            return Self::default();
        };
        url.query_pairs()
            .find(|(key, _)| key == ACCOUNT_PARAM)
            .map(|(_, value)| Self::for_account(&value))
            .unwrap_or_default()
    }

    pub fn to_query(&self) -> String {
        let Some(account_id) = &self.account_id else {
            return String::new();
        };
        let Ok(mut url) = Url::parse(LOCATION_BASE) else {
            return String::new();
        };
        url.query_pairs_mut().append_pair(ACCOUNT_PARAM, account_id);
        format!("?{}", url.query().unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Location>,
    index: usize,
}

impl History {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
        }
    }

    pub fn current(&self) -> &Location {
        &self.entries[self.index]
    }

    /// Returns false when `location` is already current and nothing was recorded.
    pub fn push(&mut self, location: Location) -> bool {
        if *self.current() == location {
            return false;
        }
        self.entries.truncate(self.index + 1);
        self.entries.push(location);
        self.index = self.entries.len() - 1;
        true
    }

    pub fn back(&mut self) -> Option<&Location> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(&self.entries[self.index])
    }

    pub fn forward(&mut self) -> Option<&Location> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(&self.entries[self.index])
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(Location::default())
    }
}
