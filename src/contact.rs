//! Deep-links to the author's chat apps. URI schemes are fire-and-forget;
//! the QQ scheme has a desktop-client fallback the caller tries only if the
//! window still has focus shortly after the first attempt.

use std::process::Command;

pub const QQ_NUMBER: &str = "1091535260";
pub const WECHAT_ID: &str = "XiaoYu_R1999";

pub const WECHAT_URI: &str = "weixin://";

pub fn qq_chat_uri() -> String {
    format!(
        "mqqwpa://im/chat?chat_type=wpa&uin={}&version=1&src_type=web&web_src=oicqzone.com",
        QQ_NUMBER
    )
}

pub fn qq_fallback_uri() -> String {
    format!("tencent://message/?uin={}&Site=&Menu=yes", QQ_NUMBER)
}

/// Hands the URI to the platform opener. Spawns without waiting so the UI
/// thread never blocks on the external app.
pub fn open_uri(uri: &str) -> bool {
    let candidates: &[(&str, &[&str])] = if cfg!(target_os = "macos") {
        &[("open", &[])]
    } else if cfg!(target_os = "windows") {
        &[("cmd", &["/C", "start", ""])]
    } else {
        &[("xdg-open", &[]), ("gio", &["open"])]
    };

    for (program, args) in candidates {
        if Command::new(program).args(*args).arg(uri).spawn().is_ok() {
            return true;
        }
    }

    eprintln!("[Contact] No opener available for {}", uri);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qq_chat_uri_embeds_number() {
        let uri = qq_chat_uri();
        assert!(uri.starts_with("mqqwpa://im/chat?"));
        assert!(uri.contains("uin=1091535260"));
        assert!(uri.contains("chat_type=wpa"));
    }

    #[test]
    fn test_qq_fallback_uri_embeds_number() {
        let uri = qq_fallback_uri();
        assert!(uri.starts_with("tencent://message/?"));
        assert!(uri.contains("uin=1091535260"));
    }
}
