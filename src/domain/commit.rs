/// A commit in the compared range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub html_url: String,
    /// Login of the hosting account the commit is attributed to
    pub author_login: Option<String>,
}

impl Commit {
    pub fn new(sha: impl Into<String>, message: impl Into<String>) -> Self {
        Commit {
            sha: sha.into(),
            message: message.into(),
            html_url: String::new(),
            author_login: None,
        }
    }

    pub fn with_author(mut self, login: impl Into<String>) -> Self {
        self.author_login = Some(login.into());
        self
    }

    pub fn with_html_url(mut self, url: impl Into<String>) -> Self {
        self.html_url = url.into();
        self
    }

    /// First line of the message (the subject)
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}
