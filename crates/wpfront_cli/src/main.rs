use std::fs;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wpfront_cli::config_loader::load_config;
use wpfront_cli::export::export_endpoints;
use wpfront_cli::server::{ServeOpts, run_server};
use wpfront_core::api::ContentClient;
use wpfront_core::config::SiteConfig;
use wpfront_core::endpoints::{build_search_index_json, build_sitemap_xml};
use wpfront_core::html_rewrite::transform_html_images;
use wpfront_core::media::{ResponsiveOptions, build_responsive};
use wpfront_core::model::{FeaturedMedia, Post};
use wpfront_core::reading_time::{ReadingTime, format_word_count, total_reading_time};
use wpfront_core::schema::{
    ArticleSchema, Breadcrumb, article_schema, breadcrumb_schema, website_schema,
};
use wpfront_core::sitemap::render_sitemap_index;
use wpfront_core::text::plain_text;
use wpfront_core::url::SiteUrls;

#[derive(Debug, Parser)]
#[command(name = "wpfront", about = "Headless WordPress blog frontend tools.")]
struct Cli {
    /// Site root holding wpfront.yaml.
    #[arg(long = "root", short = 'r', global = true)]
    root: Option<PathBuf>,
    #[arg(long, short = 'c', global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List one page of posts, newest first.")]
    Posts {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        per_page: Option<u32>,
    },
    #[command(about = "Show a post with reading time, hero image and structured data.")]
    Post { slug: String },
    #[command(about = "Show an author record.")]
    Author { id: u64 },
    #[command(about = "Print the search index JSON.")]
    SearchIndex,
    #[command(about = "Print sitemap.xml.")]
    Sitemap,
    #[command(about = "Print sitemap-index.xml.")]
    SitemapIndex,
    #[command(about = "Print the WebSite structured data.")]
    SiteSchema,
    #[command(about = "Rewrite the images of an HTML fragment file.")]
    Transform { file: PathBuf },
    #[command(about = "Estimate reading time over one or more files.")]
    ReadingTime {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        words_per_minute: Option<u32>,
    },
    #[command(about = "Write the generated endpoints to a directory.")]
    Export {
        #[arg(long, value_name = "PATH", default_value = "out")]
        out: PathBuf,
    },
    #[command(about = "Serve the generated endpoints over HTTP.")]
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long)]
        open: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let root = root_dir(&cli)?;
    let config = load_config(&root, cli.config.as_deref())?;
    match &cli.command {
        Command::Posts { page, per_page } => run_posts(&config, *page, *per_page),
        Command::Post { slug } => run_post(&config, slug),
        Command::Author { id } => run_author(&config, *id),
        Command::SearchIndex => {
            let client = ContentClient::new(&config.cms.url);
            println!("{}", build_search_index_json(&client)?);
            Ok(())
        }
        Command::Sitemap => {
            let client = ContentClient::new(&config.cms.url);
            println!("{}", build_sitemap_xml(&client, &config, Utc::now())?);
            Ok(())
        }
        Command::SitemapIndex => {
            println!("{}", render_sitemap_index(&config.site.base_url, Utc::now()));
            Ok(())
        }
        Command::SiteSchema => {
            println!("{}", website_schema(&config.site));
            Ok(())
        }
        Command::Transform { file } => {
            let html = read_input(file)?;
            println!("{}", transform_html_images(&html));
            Ok(())
        }
        Command::ReadingTime {
            files,
            words_per_minute,
        } => run_reading_time(&config, files, *words_per_minute),
        Command::Export { out } => run_export(&config, &root, out),
        Command::Serve { host, port, open } => run_server(
            ServeOpts {
                host: host.clone(),
                port: *port,
                open: *open,
            },
            ContentClient::new(&config.cms.url),
            config.clone(),
        ),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_posts(config: &SiteConfig, page: u32, per_page: Option<u32>) -> Result<()> {
    if page == 0 {
        bail!("--page starts at 1");
    }
    let per_page = per_page.unwrap_or(config.blog.page_size);
    let client = ContentClient::new(&config.cms.url);
    let result = client
        .fetch_posts(per_page, page)
        .with_context(|| format!("failed to fetch page {page}"))?;
    println!("page: {}/{}", result.current_page, result.total_pages);
    println!("total: {}", result.total_posts);
    for post in &result.posts {
        println!("{}", post_line(post));
    }
    Ok(())
}

fn run_post(config: &SiteConfig, slug: &str) -> Result<()> {
    let client = ContentClient::new(&config.cms.url);
    let Some(post) = client
        .fetch_post_by_slug(slug)
        .with_context(|| format!("failed to fetch post {slug}"))?
    else {
        bail!("no post with slug {slug:?}");
    };
    let author = client.post_author(&post);
    let urls = SiteUrls::new(&config.site.base_url);
    let reading = total_reading_time(&[post.content_html()], config.reading.words_per_minute);

    println!("title: {}", plain_text(&post.title.rendered));
    println!("url: {}", urls.post_url(&post.slug));
    println!("date: {}", post.date);
    if let Some(author) = &author {
        println!("author: {}", author.name);
    }
    println!("{}", reading_summary(&reading));

    let options = ResponsiveOptions {
        max_width: config.images.max_width,
        sizes: &config.images.sizes,
    };
    if let Some(image) = build_responsive(post.featured_media(), &options) {
        println!("hero: {}", image.to_picture_html());
    }
    if let Some(media) = post.featured_media() {
        for line in size_lines(media) {
            println!("{line}");
        }
    }

    let article = ArticleSchema::from_post(&post, author.as_ref(), &config.site);
    println!("{}", article_schema(&article));
    let crumbs = [
        Breadcrumb::new("Inicio", urls.absolute(urls.home_path())),
        Breadcrumb::new(article.headline.clone(), article.url.clone()),
    ];
    println!("{}", breadcrumb_schema(&crumbs));
    Ok(())
}

fn run_author(config: &SiteConfig, id: u64) -> Result<()> {
    let client = ContentClient::new(&config.cms.url);
    let Some(author) = client.fetch_author_by_id(id) else {
        bail!("author {id} not available");
    };
    println!("id: {}", author.id);
    println!("name: {}", author.name);
    println!("slug: {}", author.slug);
    if let Some(url) = author.url.as_deref().filter(|url| !url.is_empty()) {
        println!("url: {url}");
    }
    if let Some(description) = author.description.as_deref().filter(|text| !text.is_empty()) {
        println!("description: {}", plain_text(description));
    }
    Ok(())
}

fn run_reading_time(
    config: &SiteConfig,
    files: &[PathBuf],
    words_per_minute: Option<u32>,
) -> Result<()> {
    let rate = match words_per_minute {
        None => config.reading.words_per_minute,
        Some(value) => NonZeroU32::new(value)
            .ok_or_else(|| anyhow::anyhow!("--words-per-minute must be > 0"))?,
    };
    let contents = files
        .iter()
        .map(|file| read_input(file))
        .collect::<Result<Vec<_>>>()?;
    let refs = contents.iter().map(String::as_str).collect::<Vec<_>>();
    println!("{}", reading_summary(&total_reading_time(&refs, rate)));
    Ok(())
}

fn run_export(config: &SiteConfig, root: &Path, out: &Path) -> Result<()> {
    let out_dir = if out.is_absolute() {
        out.to_path_buf()
    } else {
        root.join(out)
    };
    let client = ContentClient::new(&config.cms.url);
    let written = export_endpoints(&client, config, &out_dir, Utc::now())?;
    println!("out: {}", out_dir.display());
    println!("files: {}", written.len());
    Ok(())
}

fn post_line(post: &Post) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        post.id,
        post.date,
        post.slug,
        plain_text(&post.title.rendered)
    )
}

fn size_lines(media: &FeaturedMedia) -> Vec<String> {
    media
        .sizes
        .iter()
        .map(|variant| {
            format!(
                "size: {}\t{}x{}\t{}",
                variant.label, variant.size.width, variant.size.height, variant.size.source_url
            )
        })
        .collect()
}

fn reading_summary(reading: &ReadingTime) -> String {
    format!(
        "reading: {} ({}, {} ms)",
        reading.text,
        format_word_count(reading.words),
        reading.time_ms
    )
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn root_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.root {
        Some(path) => {
            if path.is_absolute() {
                Ok(path.clone())
            } else {
                let cwd = std::env::current_dir().context("failed to read current directory")?;
                Ok(cwd.join(path))
            }
        }
        None => std::env::current_dir().context("failed to read current directory"),
    }
}
