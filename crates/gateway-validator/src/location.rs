use std::fmt;

/// The four request locations the validator can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Headers,
    Query,
    Body,
    Params,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Location::Headers => "headers",
            Location::Query => "query",
            Location::Body => "body",
            Location::Params => "params",
        };
        write!(f, "{s}")
    }
}
