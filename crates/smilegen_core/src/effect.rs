use crate::{Expression, ResultSource, SelectedImage, ShareAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the selected image to the expression API.
    Submit {
        image: SelectedImage,
        expression: Expression,
    },
    /// Build a local stand-in result from the original image.
    RenderPlaceholder { image: SelectedImage },
    SaveResult {
        source: ResultSource,
        filename: String,
    },
    PromptCredential,
    ClearCredential,
    Share(ShareAction),
}
