//! Flock API Methods
//!
//! Typed wrappers over the method API. Every method is a form-encoded POST to
//! `{base_url}/{namespace}.{method}` authenticated with a user or bot token.

mod error;
pub mod invoker;

use std::fmt;

use serde_json::Value;

pub use error::{MethodCallError, MethodError, MethodResult, UnexpectedResponse};
pub use invoker::{classify_response, encode_parameters, MethodInvoker, Parameters};

/// API methods with typed wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `channels.getInfo`
    ChannelsGetInfo,
    /// `channels.list`
    ChannelsList,
    /// `channels.listMembers`
    ChannelsListMembers,
    /// `chat.fetchMessages`
    ChatFetchMessages,
    /// `chat.sendMessage`
    ChatSendMessage,
    /// `roster.listContacts`
    RosterListContacts,
    /// `users.getInfo`
    UsersGetInfo,
    /// `users.getPublicProfile`
    UsersGetPublicProfile,
}

impl Method {
    /// Every wrapped method.
    pub const ALL: [Self; 8] = [
        Self::ChannelsGetInfo,
        Self::ChannelsList,
        Self::ChannelsListMembers,
        Self::ChatFetchMessages,
        Self::ChatSendMessage,
        Self::RosterListContacts,
        Self::UsersGetInfo,
        Self::UsersGetPublicProfile,
    ];

    /// Parse from the wire name (e.g., `"chat.sendMessage"`).
    pub fn parse_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }

    /// Wire name of the method.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ChannelsGetInfo => "channels.getInfo",
            Self::ChannelsList => "channels.list",
            Self::ChannelsListMembers => "channels.listMembers",
            Self::ChatFetchMessages => "chat.fetchMessages",
            Self::ChatSendMessage => "chat.sendMessage",
            Self::RosterListContacts => "roster.listContacts",
            Self::UsersGetInfo => "users.getInfo",
            Self::UsersGetPublicProfile => "users.getPublicProfile",
        }
    }

    /// Namespace part of the wire name.
    pub fn namespace(&self) -> &'static str {
        self.as_str().split('.').next().unwrap_or_default()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turn a JSON object into method parameters; anything else is empty.
pub fn params(value: Value) -> Parameters {
    match value {
        Value::Object(map) => map,
        _ => Parameters::new(),
    }
}

impl MethodInvoker {
    /// Call a wrapped method.
    pub async fn call(
        &self,
        method: Method,
        token: &str,
        parameters: Parameters,
    ) -> MethodResult<Value> {
        self.invoke(method.as_str(), token, parameters).await
    }

    /// `channels.*` methods.
    pub const fn channels(&self) -> Channels<'_> {
        Channels { invoker: self }
    }

    /// `chat.*` methods.
    pub const fn chat(&self) -> Chat<'_> {
        Chat { invoker: self }
    }

    /// `roster.*` methods.
    pub const fn roster(&self) -> Roster<'_> {
        Roster { invoker: self }
    }

    /// `users.*` methods.
    pub const fn users(&self) -> Users<'_> {
        Users { invoker: self }
    }
}

/// `channels.*` methods.
#[derive(Debug, Clone, Copy)]
pub struct Channels<'a> {
    invoker: &'a MethodInvoker,
}

impl Channels<'_> {
    /// Get information about a channel.
    pub async fn get_info(&self, token: &str, parameters: Parameters) -> MethodResult<Value> {
        self.invoker
            .call(Method::ChannelsGetInfo, token, parameters)
            .await
    }

    /// List the channels the user is a member of.
    pub async fn list(&self, token: &str, parameters: Parameters) -> MethodResult<Value> {
        self.invoker.call(Method::ChannelsList, token, parameters).await
    }

    /// List the members of a channel.
    pub async fn list_members(&self, token: &str, parameters: Parameters) -> MethodResult<Value> {
        self.invoker
            .call(Method::ChannelsListMembers, token, parameters)
            .await
    }
}

/// `chat.*` methods.
#[derive(Debug, Clone, Copy)]
pub struct Chat<'a> {
    invoker: &'a MethodInvoker,
}

impl Chat<'_> {
    /// Fetch messages by UID from a conversation.
    pub async fn fetch_messages(&self, token: &str, parameters: Parameters) -> MethodResult<Value> {
        self.invoker
            .call(Method::ChatFetchMessages, token, parameters)
            .await
    }

    /// Send a message to a user or channel.
    pub async fn send_message(&self, token: &str, parameters: Parameters) -> MethodResult<Value> {
        self.invoker
            .call(Method::ChatSendMessage, token, parameters)
            .await
    }
}

/// `roster.*` methods.
#[derive(Debug, Clone, Copy)]
pub struct Roster<'a> {
    invoker: &'a MethodInvoker,
}

impl Roster<'_> {
    /// List the user's contacts.
    pub async fn list_contacts(&self, token: &str, parameters: Parameters) -> MethodResult<Value> {
        self.invoker
            .call(Method::RosterListContacts, token, parameters)
            .await
    }
}

/// `users.*` methods.
#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    invoker: &'a MethodInvoker,
}

impl Users<'_> {
    /// Get information about the token's user.
    pub async fn get_info(&self, token: &str, parameters: Parameters) -> MethodResult<Value> {
        self.invoker.call(Method::UsersGetInfo, token, parameters).await
    }

    /// Get the public profile of a user.
    pub async fn get_public_profile(
        &self,
        token: &str,
        parameters: Parameters,
    ) -> MethodResult<Value> {
        self.invoker
            .call(Method::UsersGetPublicProfile, token, parameters)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_names_round_trip() {
        for method in Method::ALL {
            assert_eq!(Method::parse_str(method.as_str()), Some(method));
        }
        assert_eq!(Method::parse_str("chat.deleteMessage"), None);
    }

    #[test]
    fn namespaces() {
        assert_eq!(Method::ChatSendMessage.namespace(), "chat");
        assert_eq!(Method::UsersGetPublicProfile.namespace(), "users");
        assert_eq!(Method::ChannelsListMembers.to_string(), "channels.listMembers");
    }

    #[test]
    fn params_accepts_only_objects() {
        assert_eq!(params(json!({"to": "u:1"})).len(), 1);
        assert!(params(json!([1, 2])).is_empty());
    }
}
