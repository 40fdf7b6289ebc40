use url::form_urlencoded;

const FACEBOOK_SHARER: &str = "https://www.facebook.com/sharer/sharer.php";
const TWITTER_INTENT: &str = "https://twitter.com/intent/tweet";

pub const SHARE_TEXT: &str = "Check out this amazing AI Smile Generator! Transform any photo with AI-powered smile generation.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharePlatform {
    Facebook,
    Twitter,
    Instagram,
    Copy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareAction {
    /// Open a share dialog at this address.
    OpenUrl(String),
    /// Put the page link on the clipboard; Instagram has no web share intent.
    CopyLink(String),
}

pub fn share_action(platform: SharePlatform, page_url: &str) -> ShareAction {
    match platform {
        SharePlatform::Facebook => {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("u", page_url)
                .finish();
            ShareAction::OpenUrl(format!("{FACEBOOK_SHARER}?{query}"))
        }
        SharePlatform::Twitter => {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("text", SHARE_TEXT)
                .append_pair("url", page_url)
                .finish();
            ShareAction::OpenUrl(format!("{TWITTER_INTENT}?{query}"))
        }
        SharePlatform::Instagram | SharePlatform::Copy => ShareAction::CopyLink(page_url.to_string()),
    }
}
