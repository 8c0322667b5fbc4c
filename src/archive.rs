use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::AppError;
use crate::record::format_file_size;
use crate::render::PreviewImage;

pub fn deployment_runbook(slug: &str, public_url: &str, html_bytes: usize, image_bytes: usize) -> String {
    format!(
        "# Deployment Runbook\n\
         \n\
         Annotation package for `{slug}`.\n\
         \n\
         ## Public URL\n\
         \n\
         {public_url}\n\
         \n\
         The preview image is expected at {public_url}preview.jpg.\n\
         \n\
         ## Contents\n\
         \n\
         | File | Size |\n\
         | ---- | ---- |\n\
         | index.html | {html_size} |\n\
         | preview.jpg | {image_size} |\n\
         | DEPLOYMENT.md | this file |\n\
         \n\
         ## Deploy\n\
         \n\
         Unpack the archive into your site checkout and push:\n\
         \n\
         ```\n\
         unzip {slug}.zip -d annotations/\n\
         git add annotations/{slug}\n\
         git commit -m \"Add annotation {slug}\"\n\
         git push origin main\n\
         ```\n\
         \n\
         The page goes live at {public_url} once the static host picks up the push.\n",
        slug = slug,
        public_url = public_url,
        html_size = format_file_size(html_bytes as u64),
        image_size = format_file_size(image_bytes as u64),
    )
}

pub fn build_archive(
    slug: &str,
    html: &str,
    preview: &PreviewImage,
    runbook: &str,
) -> Result<Vec<u8>, AppError> {
    log::debug!("Assembling archive for slug: {}", slug);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(format!("{}/index.html", slug), options)?;
    zip.write_all(html.as_bytes())?;

    zip.start_file(format!("{}/preview.jpg", slug), options)?;
    zip.write_all(&preview.bytes)?;

    zip.start_file(format!("{}/DEPLOYMENT.md", slug), options)?;
    zip.write_all(runbook.as_bytes())?;

    let cursor = zip.finish()?;
    let bytes = cursor.into_inner();
    log::info!(
        "Archive for {} assembled ({})",
        slug,
        format_file_size(bytes.len() as u64)
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn sample_preview() -> PreviewImage {
        PreviewImage {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10],
            width: 1200,
            height: 630,
        }
    }

    #[test]
    fn archive_contains_the_three_expected_entries() {
        let preview = sample_preview();
        let runbook = deployment_runbook("alpha", "https://x.test/annotations/alpha/", 10, 6);
        let bytes = build_archive("alpha", "<html></html>", &preview, &runbook).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "alpha/index.html",
                "alpha/preview.jpg",
                "alpha/DEPLOYMENT.md"
            ]
        );

        let mut html = String::new();
        archive
            .by_name("alpha/index.html")
            .unwrap()
            .read_to_string(&mut html)
            .unwrap();
        assert_eq!(html, "<html></html>");

        let mut image = Vec::new();
        archive
            .by_name("alpha/preview.jpg")
            .unwrap()
            .read_to_end(&mut image)
            .unwrap();
        assert_eq!(image, sample_preview().bytes);
    }

    #[test]
    fn runbook_embeds_url_manifest_and_git_commands() {
        let runbook =
            deployment_runbook("alpha", "https://x.test/annotations/alpha/", 2048, 1024);
        assert!(runbook.contains("https://x.test/annotations/alpha/"));
        assert!(runbook.contains("https://x.test/annotations/alpha/preview.jpg"));
        assert!(runbook.contains("| index.html | 2 KB |"));
        assert!(runbook.contains("| preview.jpg | 1 KB |"));
        assert!(runbook.contains("git add annotations/alpha"));
        assert!(runbook.contains("git commit -m \"Add annotation alpha\""));
        assert!(runbook.contains("git push origin main"));
    }
}
