use crate::config::REPLY_TAG;
use std::fmt;

/// Reply text contributed by one dispatched command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// `KEY:Done!;`
    Done { key: String },
    /// `KEY:<reason>;`
    Failed { key: String, reason: &'static str },
    /// `Unknown key:KEY;`
    UnknownKey(String),
    /// `Unknown msg:TOKEN;`
    UnknownMsg(String),
}

impl Fragment {
    pub fn done(key: &str) -> Self {
        Fragment::Done {
            key: key.to_string(),
        }
    }

    pub fn failed(key: &str, reason: &'static str) -> Self {
        Fragment::Failed {
            key: key.to_string(),
            reason,
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Done { key } => write!(f, "{}:Done!;", key),
            Fragment::Failed { key, reason } => write!(f, "{}:{};", key, reason),
            Fragment::UnknownKey(key) => write!(f, "Unknown key:{};", key),
            Fragment::UnknownMsg(token) => write!(f, "Unknown msg:{};", token),
        }
    }
}

/// Ordered fragments of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub fragments: Vec<Fragment>,
}

impl Reply {
    pub fn push(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    /// Encode the reply for the wire.
    ///
    /// An empty reply encodes to `None` and nothing is written back.
    pub fn encode(&self) -> Option<String> {
        if self.fragments.is_empty() {
            return None;
        }
        let mut out = String::from(REPLY_TAG);
        for fragment in &self.fragments {
            out.push_str(&fragment.to_string());
        }
        Some(out)
    }
}

/// Format a batch reply into the string sent to the client
///
/// # Arguments
/// * `reply` - The aggregated reply of one request
///
/// # Returns
/// * `Option<String>` - The tagged reply, or `None` when there is nothing to send
pub fn format_response(reply: &Reply) -> Option<String> {
    reply.encode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_rendering() {
        assert_eq!(Fragment::done("FILE").to_string(), "FILE:Done!;");
        assert_eq!(
            Fragment::failed("FILE", "Error file path").to_string(),
            "FILE:Error file path;"
        );
        assert_eq!(
            Fragment::failed("AXES", "Index error").to_string(),
            "AXES:Index error;"
        );
        assert_eq!(
            Fragment::UnknownKey("FOO".to_string()).to_string(),
            "Unknown key:FOO;"
        );
        assert_eq!(
            Fragment::UnknownMsg("GARBAGE".to_string()).to_string(),
            "Unknown msg:GARBAGE;"
        );
    }

    #[test]
    fn test_empty_reply_is_not_sent() {
        assert_eq!(format_response(&Reply::default()), None);
    }

    #[test]
    fn test_reply_is_tagged_and_ordered() {
        let mut reply = Reply::default();
        reply.push(Fragment::done("AXES"));
        reply.push(Fragment::done("SHOW"));
        assert_eq!(
            format_response(&reply).as_deref(),
            Some("qtplot:AXES:Done!;SHOW:Done!;")
        );
    }
}
