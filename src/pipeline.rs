use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, Utc};

use crate::archive::{build_archive, deployment_runbook};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::extract::{extract_description, extract_title};
use crate::inject::{inject_meta_tags, MetaTags};
use crate::record::{format_file_size, generate_file_id, AnnotationRecord};
use crate::render::{
    passthrough_image, render_generated, FontMetrics, PreviewImage, CANVAS_HEIGHT, CANVAS_WIDTH,
    MAX_CUSTOM_IMAGE_BYTES,
};
use crate::shorten::UrlShortener;
use crate::store::MetadataStore;

#[derive(Debug, Clone)]
pub enum ImageSource {
    Generated,
    Custom(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packaging {
    Archive,
    Flat,
}

pub struct PublishOptions {
    pub input: PathBuf,
    pub image: ImageSource,
    pub packaging: Packaging,
    pub shorten: bool,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub expiry: Option<NaiveDate>,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct PublishOutcome {
    pub record: AnnotationRecord,
    pub artifact_path: PathBuf,
    pub share_url: String,
}

fn is_html_file(path: &Path) -> bool {
    let by_mime = mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().contains("html"))
        .unwrap_or(false);
    let by_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("html"))
        .unwrap_or(false);
    by_mime || by_ext
}

fn validate_custom_image(path: &Path) -> Result<(), AppError> {
    let is_image = mime_guess::from_path(path)
        .first()
        .map(|m| m.type_() == mime::IMAGE)
        .unwrap_or(false);
    if !is_image {
        return Err(AppError::validation(format!(
            "{} is not an image file",
            path.display()
        )));
    }
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_CUSTOM_IMAGE_BYTES {
        return Err(AppError::validation(format!(
            "Custom image exceeds the {} limit",
            format_file_size(MAX_CUSTOM_IMAGE_BYTES)
        )));
    }
    Ok(())
}

fn normalized_base_url(config: &AppConfig) -> String {
    let mut base = config.site_base_url.clone();
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}

// One pipeline for every publishing shape: generated or custom preview
// image, archive or flat packaging, with or without a short URL.
pub async fn publish(
    config: &AppConfig,
    store: &MetadataStore,
    shortener: &dyn UrlShortener,
    options: PublishOptions,
) -> Result<PublishOutcome, AppError> {
    // All validation happens before any side effect.
    if !is_html_file(&options.input) {
        return Err(AppError::validation(format!(
            "{} is not an HTML file",
            options.input.display()
        )));
    }

    let today = Utc::now().date_naive();
    let expiry = options
        .expiry
        .unwrap_or_else(|| today + Duration::days(config.default_expiry_days));
    if expiry <= today {
        return Err(AppError::validation(
            "Expiry date must be in the future".to_string(),
        ));
    }

    if let ImageSource::Custom(image_path) = &options.image {
        if options.packaging == Packaging::Flat {
            return Err(AppError::validation(
                "A custom image requires archive packaging".to_string(),
            ));
        }
        validate_custom_image(image_path)?;
    }

    log::info!("Publishing {}", options.input.display());
    let content = tokio::fs::read_to_string(&options.input).await?;
    let input_size = tokio::fs::metadata(&options.input).await?.len();

    let original_name = options
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("annotation.html")
        .to_string();

    let file_id = generate_file_id();
    let slug = options.slug.clone().unwrap_or_else(|| file_id.clone());
    let file_name = match &options.slug {
        Some(custom) => format!("{}.html", custom),
        None => format!("annotation-{}.html", file_id),
    };

    let base = normalized_base_url(config);
    let (public_url, image_url) = match options.packaging {
        Packaging::Archive => {
            let public = format!("{}annotations/{}/", base, slug);
            let image = format!("{}preview.jpg", public);
            (public, image)
        }
        Packaging::Flat => {
            let public = format!("{}annotations/{}", base, file_name);
            let image = format!("{}preview-image.jpg", base);
            (public, image)
        }
    };

    let title_fallback = original_name
        .strip_suffix(".html")
        .unwrap_or(&original_name);
    let title = extract_title(&content, title_fallback);
    let description = extract_description(&content, options.description.as_deref());

    // Flat packaging ships no image of its own; the tags point at the
    // site-wide static preview at canonical dimensions.
    let preview: Option<PreviewImage> = match (&options.image, options.packaging) {
        (_, Packaging::Flat) => None,
        (ImageSource::Custom(image_path), _) => {
            let bytes = tokio::fs::read(image_path).await?;
            Some(passthrough_image(&bytes)?)
        }
        (ImageSource::Generated, _) => {
            let fonts = FontMetrics::load();
            Some(render_generated(&title, &description, fonts.as_ref())?)
        }
    };
    let (image_width, image_height) = preview
        .as_ref()
        .map(|p| (p.width, p.height))
        .unwrap_or((CANVAS_WIDTH, CANVAS_HEIGHT));

    let tags = MetaTags {
        title: &title,
        description: &description,
        public_url: &public_url,
        image_url: &image_url,
        image_width,
        image_height,
        site_name: &config.site_name,
    };
    let enhanced = inject_meta_tags(&content, &tags);

    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output_dir));
    tokio::fs::create_dir_all(&output_dir).await?;

    // Flat packaging carries no preview by construction, so the artifact
    // shape keys off its presence.
    let artifact_path = match preview.as_ref() {
        Some(preview) => {
            let runbook =
                deployment_runbook(&slug, &public_url, enhanced.len(), preview.bytes.len());
            let bytes = build_archive(&slug, &enhanced, preview, &runbook)?;
            let path = output_dir.join(format!("{}.zip", slug));
            tokio::fs::write(&path, bytes).await?;
            path
        }
        None => {
            let path = output_dir.join(&file_name);
            tokio::fs::write(&path, enhanced.as_bytes()).await?;
            path
        }
    };
    log::info!("Wrote {}", artifact_path.display());

    let record = AnnotationRecord {
        id: file_id.clone(),
        file_name,
        original_name,
        created: Utc::now(),
        expiry,
        slug,
        description: options.description.clone().unwrap_or_default(),
        public_url: public_url.clone(),
        file_size: format_file_size(input_size),
        custom_image: matches!(options.image, ImageSource::Custom(_)),
        preview_title: title,
        preview_description: description,
    };

    // A failed metadata persist never blocks a successful publish.
    let mut records = store.load();
    records.insert(file_id, record.clone());
    if let Err(e) = store.save(&records) {
        log::error!("Error saving metadata: {}", e);
    }

    let share_url = if options.shorten {
        shortener.shorten(&public_url).await
    } else {
        public_url
    };

    Ok(PublishOutcome {
        record,
        artifact_path,
        share_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::GenericImageView;
    use std::io::Read;

    struct FixedShortener(String);

    #[async_trait]
    impl UrlShortener for FixedShortener {
        async fn shorten(&self, _long_url: &str) -> String {
            self.0.clone()
        }
    }

    struct NeverShortener;

    #[async_trait]
    impl UrlShortener for NeverShortener {
        async fn shorten(&self, long_url: &str) -> String {
            long_url.to_string()
        }
    }

    fn test_config(dir: &Path) -> AppConfig {
        AppConfig {
            site_base_url: "https://annotationhub.com/".to_string(),
            site_name: "Annotation Hub".to_string(),
            store_path: dir.join("store.json").to_string_lossy().into_owned(),
            output_dir: dir.to_string_lossy().into_owned(),
            shortener_endpoints: vec![],
            default_expiry_days: 7,
            log_level: "info".to_string(),
        }
    }

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("annotation-hub-{}", generate_file_id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn base_options(input: PathBuf) -> PublishOptions {
        PublishOptions {
            input,
            image: ImageSource::Generated,
            packaging: Packaging::Archive,
            shorten: false,
            slug: None,
            description: None,
            expiry: None,
            output_dir: None,
        }
    }

    #[tokio::test]
    async fn non_html_input_is_rejected_before_any_side_effect() {
        let dir = scratch_dir();
        let config = test_config(&dir);
        let store = MetadataStore::new(&config.store_path);

        let input = dir.join("photo.png");
        std::fs::write(&input, b"not really a png").unwrap();

        let err = publish(&config, &store, &NeverShortener, base_options(input))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.load().is_empty());
        assert!(std::fs::read_dir(&dir).unwrap().count() <= 1);
    }

    #[tokio::test]
    async fn oversized_custom_image_is_rejected_before_decoding() {
        let dir = scratch_dir();
        let config = test_config(&dir);
        let store = MetadataStore::new(&config.store_path);

        let input = dir.join("page.html");
        std::fs::write(&input, "<html><head></head><body></body></html>").unwrap();

        // Not decodable as an image; a size check must fire first.
        let big = dir.join("big.jpg");
        std::fs::write(&big, vec![b'x'; (MAX_CUSTOM_IMAGE_BYTES + 1) as usize]).unwrap();

        let mut options = base_options(input);
        options.image = ImageSource::Custom(big);
        let err = publish(&config, &store, &NeverShortener, options)
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("5 MB")),
            other => panic!("expected validation error, got {}", other),
        }
    }

    #[tokio::test]
    async fn past_expiry_is_rejected() {
        let dir = scratch_dir();
        let config = test_config(&dir);
        let store = MetadataStore::new(&config.store_path);

        let input = dir.join("page.html");
        std::fs::write(&input, "<html><head></head><body></body></html>").unwrap();

        let mut options = base_options(input);
        options.expiry = NaiveDate::from_ymd_opt(2020, 1, 1);
        let err = publish(&config, &store, &NeverShortener, options)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn custom_image_archive_publish_end_to_end() {
        let dir = scratch_dir();
        let config = test_config(&dir);
        let store = MetadataStore::new(&config.store_path);

        let input = dir.join("notes.html");
        std::fs::write(
            &input,
            "<html><head><title>Field Notes</title>\n</head><body><p>body</p></body></html>",
        )
        .unwrap();

        let image_path = dir.join("shot.png");
        image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            400,
            250,
            image::Rgb([200, 40, 40]),
        ))
        .save(&image_path)
        .unwrap();

        let mut options = base_options(input);
        options.image = ImageSource::Custom(image_path);
        options.slug = Some("field-notes".to_string());
        options.description = Some("A walk through the field".to_string());

        let outcome = publish(&config, &store, &NeverShortener, options)
            .await
            .unwrap();

        assert_eq!(
            outcome.record.public_url,
            "https://annotationhub.com/annotations/field-notes/"
        );
        assert_eq!(outcome.share_url, outcome.record.public_url);
        assert!(outcome.record.custom_image);
        assert_eq!(outcome.record.preview_title, "Field Notes");

        let archive_bytes = std::fs::read(&outcome.artifact_path).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(archive_bytes)).unwrap();
        let mut html = String::new();
        archive
            .by_name("field-notes/index.html")
            .unwrap()
            .read_to_string(&mut html)
            .unwrap();
        assert!(html.contains(r#"<meta property="og:image:width" content="400">"#));
        assert!(html.contains(r#"<meta property="og:image:height" content="250">"#));
        assert!(html.contains(r#"<meta property="og:title" content="Field Notes">"#));

        let mut image_bytes = Vec::new();
        archive
            .by_name("field-notes/preview.jpg")
            .unwrap()
            .read_to_end(&mut image_bytes)
            .unwrap();
        let decoded = image::load_from_memory(&image_bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 250));

        let records = store.load();
        assert_eq!(records.len(), 1);
        assert_eq!(records[&outcome.record.id].slug, "field-notes");
    }

    #[tokio::test]
    async fn flat_publish_writes_enhanced_html_only() {
        let dir = scratch_dir();
        let config = test_config(&dir);
        let store = MetadataStore::new(&config.store_path);

        let input = dir.join("page.html");
        std::fs::write(
            &input,
            "<html><head><title>Flat Page</title>\n</head><body></body></html>",
        )
        .unwrap();

        let mut options = base_options(input);
        options.packaging = Packaging::Flat;
        options.slug = Some("flat-page".to_string());

        let outcome = publish(&config, &store, &NeverShortener, options)
            .await
            .unwrap();

        assert_eq!(
            outcome.record.public_url,
            "https://annotationhub.com/annotations/flat-page.html"
        );
        assert!(outcome.artifact_path.ends_with("flat-page.html"));

        let html = std::fs::read_to_string(&outcome.artifact_path).unwrap();
        assert!(html.contains(
            r#"<meta property="og:image" content="https://annotationhub.com/preview-image.jpg">"#
        ));
        assert!(html.contains(r#"<meta property="og:image:width" content="1200">"#));
        assert!(!dir.join("flat-page.zip").exists());
    }

    #[tokio::test]
    async fn short_url_is_surfaced_when_shortening_succeeds() {
        let dir = scratch_dir();
        let config = test_config(&dir);
        let store = MetadataStore::new(&config.store_path);

        let input = dir.join("page.html");
        std::fs::write(
            &input,
            "<html><head><title>T</title>\n</head><body></body></html>",
        )
        .unwrap();

        let mut options = base_options(input);
        options.shorten = true;
        let shortener = FixedShortener("https://short.test/abc".to_string());
        let outcome = publish(&config, &store, &shortener, options).await.unwrap();
        assert_eq!(outcome.share_url, "https://short.test/abc");
    }
}
