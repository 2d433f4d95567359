//! Browser reload channel.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// WebSocket endpoint the client script connects to.
pub const RELOAD_PATH: &str = "/__brisk/reload";

/// Route serving [`client_script`].
pub const CLIENT_PATH: &str = "/__brisk/client.js";

/// Messages pushed to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// Sent once when a socket opens
    Connected,

    /// Full page reload
    Reload,

    /// Swap one stylesheet in place
    InjectCss {
        /// URL path of the stylesheet, e.g. `/css/main.css`
        path: String,
    },
}

/// Hub for broadcasting reload messages to all connected clients.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to every connected client.
    pub fn send(&self, msg: ReloadMessage) {
        // No receivers just means no browser is open.
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    /// Number of connected clients.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

/// The script served at [`CLIENT_PATH`].
///
/// `inject_css` re-requests every `<link rel="stylesheet">` whose path ends
/// with the changed file, with a cache-busting query; if none matches the
/// page is reloaded.
pub fn client_script() -> String {
    format!(
        r#"(function() {{
  'use strict';

  var protocol = location.protocol === 'https:' ? 'wss://' : 'ws://';
  var ws = new WebSocket(protocol + location.host + '{reload}');

  function injectCss(path) {{
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    var swapped = false;
    links.forEach(function(link) {{
      var url = new URL(link.href, location.href);
      if (url.pathname === path || url.pathname.endsWith(path)) {{
        url.searchParams.set('brisk', Date.now());
        link.href = url.toString();
        swapped = true;
      }}
    }});
    if (!swapped) {{
      location.reload();
    }}
  }}

  ws.onmessage = function(event) {{
    var msg = JSON.parse(event.data);
    switch (msg.type) {{
      case 'reload':
        location.reload();
        break;
      case 'inject_css':
        injectCss(msg.path);
        break;
      case 'connected':
        console.log('[brisk] live reload connected');
        break;
    }}
  }};

  ws.onclose = function() {{
    console.log('[brisk] live reload disconnected');
  }};
}})();
"#,
        reload = RELOAD_PATH
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hub_broadcasts_messages() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        hub.send(ReloadMessage::Reload);

        assert_eq!(rx.try_recv().unwrap(), ReloadMessage::Reload);
        assert_eq!(hub.subscriber_count(), 1);
    }

    #[test]
    fn send_without_clients_is_fine() {
        ReloadHub::new().send(ReloadMessage::Reload);
    }

    #[test]
    fn serializes_tagged_messages() {
        let msg = ReloadMessage::InjectCss {
            path: "/css/main.css".to_string(),
        };

        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"inject_css","path":"/css/main.css"}"#
        );
        assert_eq!(
            serde_json::to_string(&ReloadMessage::Reload).unwrap(),
            r#"{"type":"reload"}"#
        );
    }

    #[test]
    fn client_connects_to_reload_endpoint() {
        let script = client_script();

        assert!(script.contains("location.host + '/__brisk/reload'"));
        assert!(script.contains("case 'inject_css'"));
    }
}
