#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Kind of message delivered to a streaming callback.
pub enum MessageKind {
    /// A piece of generated text. Usually one per token; a token ending inside
    /// a multi-byte character is delivered with the token that completes it.
    Chunk,
}

impl MessageKind {
    /// Returns the string representation of the message kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Chunk => "chunk",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Signal returned by a streaming callback after each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamControl {
    /// Keep the chunk and continue generating.
    Continue,
    /// Drop the chunk and end generation.
    Stop,
}

impl StreamControl {
    pub fn is_stop(&self) -> bool {
        matches!(self, StreamControl::Stop)
    }
}

impl From<bool> for StreamControl {
    /// `true` continues, `false` stops, matching hosts that answer with a flag.
    fn from(keep_going: bool) -> Self {
        if keep_going {
            StreamControl::Continue
        } else {
            StreamControl::Stop
        }
    }
}

/// Callback invoked once per generated chunk.
///
/// Returning `Err` aborts generation; the error is reported through
/// [`PartialGeneration`](crate::core::PartialGeneration) together with the
/// text produced so far.
pub type ChunkCallback<'a> = dyn FnMut(&str, MessageKind) -> anyhow::Result<StreamControl> + 'a;
