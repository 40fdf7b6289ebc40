use smilegen_core::{
    Expression, FailureCategory, ProcessFailure, ResultSource, SelectedImage, Stage,
};
use smilegen_engine::{
    ClientError, DataUrl, FailureKind, ImageUpload, Optimization, ResultImage,
};

pub fn map_stage(stage: smilegen_engine::Stage) -> Stage {
    match stage {
        smilegen_engine::Stage::Preparing => Stage::Preparing,
        smilegen_engine::Stage::Sending => Stage::Sending,
        smilegen_engine::Stage::Analyzing => Stage::Analyzing,
        smilegen_engine::Stage::Generating => Stage::Generating,
    }
}

pub fn map_expression(expression: Expression) -> smilegen_engine::Expression {
    match expression {
        Expression::DimpleSmile => smilegen_engine::Expression::DimpleSmile,
        Expression::PearDimpleSmile => smilegen_engine::Expression::PearDimpleSmile,
        Expression::BigGrin => smilegen_engine::Expression::BigGrin,
        Expression::StandardGrin => smilegen_engine::Expression::StandardGrin,
        Expression::CoolPose => smilegen_engine::Expression::CoolPose,
        Expression::Sad => smilegen_engine::Expression::Sad,
        Expression::ForcedSmile => smilegen_engine::Expression::ForcedSmile,
        Expression::OpeningEyes => smilegen_engine::Expression::OpeningEyes,
    }
}

pub fn map_failure(err: &ClientError) -> ProcessFailure {
    let category = match err.kind {
        FailureKind::Validation => FailureCategory::Validation,
        FailureKind::MissingCredential => FailureCategory::MissingCredential,
        FailureKind::Api { .. } => FailureCategory::Api,
        FailureKind::Timeout => FailureCategory::Timeout,
        FailureKind::Network => FailureCategory::Network,
        FailureKind::InvalidResponse => FailureCategory::InvalidResponse,
        FailureKind::ResultNotReady => FailureCategory::ResultNotReady,
    };
    ProcessFailure::new(category, err.status(), err.message.clone())
}

pub fn to_source(image: ResultImage) -> ResultSource {
    match image {
        ResultImage::Inline(data_url) => ResultSource::Inline(data_url.into_string()),
        ResultImage::Remote(url) => ResultSource::Remote(url),
    }
}

pub fn from_source(source: ResultSource) -> ResultImage {
    match source {
        ResultSource::Inline(payload) => ResultImage::Inline(DataUrl::normalize(&payload)),
        ResultSource::Remote(url) => ResultImage::Remote(url),
    }
}

pub fn selected_image(upload: &ImageUpload, optimization: Option<&Optimization>) -> SelectedImage {
    SelectedImage {
        name: upload.file_name.clone(),
        mime: upload.mime.clone(),
        size: upload.size(),
        original_size: optimization.map(|report| report.original_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_codes_survive_mapping() {
        assert_eq!(map_expression(Expression::DimpleSmile).code(), 10);
        assert_eq!(map_expression(Expression::ForcedSmile).code(), 16);
        assert_eq!(map_expression(Expression::OpeningEyes).code(), 100);
    }

    #[test]
    fn inline_source_round_trips_through_engine_type() {
        let source = ResultSource::Inline("data:image/jpeg;base64,AAEC".to_string());
        assert_eq!(to_source(from_source(source.clone())), source);
    }

    #[test]
    fn selected_image_mirrors_upload() {
        let upload = ImageUpload::new("me.png", "image/png", vec![0; 10]);
        let image = selected_image(&upload, None);
        assert_eq!(image.name, "me.png");
        assert_eq!(image.size, 10);
        assert_eq!(image.original_size, None);
        assert_eq!(image.download_filename(), "me_smile.jpg");
    }

    #[test]
    fn selected_image_keeps_pre_optimization_size() {
        let upload = ImageUpload::new("big.png", "image/jpeg", vec![0; 300]);
        let report = Optimization {
            original_size: 9_000,
            optimized_size: 300,
            width: 2048,
            height: 1365,
        };
        let image = selected_image(&upload, Some(&report));
        assert_eq!(image.size, 300);
        assert_eq!(image.original_size, Some(9_000));
        assert_eq!(image.mime, "image/jpeg");
    }
}
