//! 图标生成模块：
//! - 未提供源图时，合成渐变底 + 首字母的占位图（SVG 经 resvg 光栅化为临时 PNG）
//! - 支持位图与 SVG 源图；SVG 按目标尺寸直接渲染，不经过中间大图
//! - 按 `ICON_SPECS` 以 cover 方式（居中裁剪、保持比例）缩放并写出 PNG

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::{imageops::FilterType, DynamicImage, ImageFormat, Rgba, RgbaImage};
use resvg::{tiny_skia, usvg};
use thiserror::Error;

use crate::{
    config::ICON_SPECS,
    utils::{placeholder_initial, xml_escape},
};

/// 占位图画布边长
const BASE_SIZE: u32 = 512;
/// 渐变终点色
const GRADIENT_END: &str = "#667eea";
/// 临时占位图文件名（生成结束后删除）
const BASE_TEMP_NAME: &str = "base-temp.png";
/// 占位字母使用的内置字体，保证无系统字体时也能渲染
static PLACEHOLDER_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");
const PLACEHOLDER_FONT_FAMILY: &str = "DejaVu Sans";

#[derive(Debug, Error)]
pub(crate) enum IconError {
    #[error("图标源文件不存在或不可读: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("SVG 解析失败")]
    Svg(#[from] usvg::Error),

    #[error("无法创建 {0}x{1} 画布")]
    Canvas(u32, u32),

    #[error("图像处理失败")]
    Image(#[from] image::ImageError),

    #[error("文件读写失败")]
    Io(#[from] std::io::Error),
}

/// 生成全部图标，返回写出的文件路径
pub(crate) fn generate_icons(
    source: Option<&Path>,
    out_dir: &Path,
    app_name: &str,
    theme_color: &str,
) -> Result<Vec<PathBuf>, IconError> {
    fs::create_dir_all(out_dir)?;

    let (src_path, temp) = match source {
        Some(p) => {
            if fs::File::open(p).is_err() {
                return Err(IconError::SourceNotFound(p.to_path_buf()));
            }
            (p.to_path_buf(), None)
        }
        None => {
            let tmp = out_dir.join(BASE_TEMP_NAME);
            let initial = placeholder_initial(app_name);
            create_base_icon(&tmp, &initial, theme_color)?;
            println!("   ✓ 默认图标已生成（{}）", initial);
            (tmp.clone(), Some(tmp))
        }
    };

    let result = load_source(&src_path).and_then(|src| resize_all(&src, out_dir));

    // 清理临时占位图（失败不影响结果）
    if let Some(tmp) = temp {
        if let Err(e) = fs::remove_file(&tmp) {
            log::debug!("删除临时图标失败: {}: {}", tmp.display(), e);
        }
    }
    result
}

/// 占位图 SVG：圆角方形 + 对角渐变 + 居中白色粗体字母
pub(crate) fn base_icon_svg(initial: &str, theme_color: &str) -> String {
    format!(
        r##"<svg width="{size}" height="{size}" viewBox="0 0 {size} {size}" xmlns="http://www.w3.org/2000/svg">
  <defs>
    <linearGradient id="grad" x1="0%" y1="0%" x2="100%" y2="100%">
      <stop offset="0%" stop-color="{start}" stop-opacity="1"/>
      <stop offset="100%" stop-color="{end}" stop-opacity="1"/>
    </linearGradient>
  </defs>
  <rect width="{size}" height="{size}" fill="url(#grad)" rx="100"/>
  <text x="50%" y="50%" font-family="{family}, sans-serif" font-size="280" font-weight="bold" fill="white" text-anchor="middle" dy=".35em">{letter}</text>
</svg>"##,
        size = BASE_SIZE,
        start = theme_color,
        end = GRADIENT_END,
        letter = xml_escape(initial),
        family = PLACEHOLDER_FONT_FAMILY,
    )
}

fn create_base_icon(path: &Path, initial: &str, theme_color: &str) -> Result<(), IconError> {
    let tree = parse_svg(&base_icon_svg(initial, theme_color))?;
    let img = render_cover(&tree, BASE_SIZE)?;
    img.save_with_format(path, ImageFormat::Png)?;
    log::debug!("临时占位图: {}", path.display());
    Ok(())
}

/// 已加载的源图
enum Source {
    Bitmap(DynamicImage),
    Vector(usvg::Tree),
}

fn load_source(path: &Path) -> Result<Source, IconError> {
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);
    if is_svg {
        let text = fs::read_to_string(path)?;
        Ok(Source::Vector(parse_svg(&text)?))
    } else {
        Ok(Source::Bitmap(image::open(path)?))
    }
}

fn parse_svg(svg: &str) -> Result<usvg::Tree, IconError> {
    let mut opt = usvg::Options::default();
    let fontdb = opt.fontdb_mut();
    fontdb.load_system_fonts();
    fontdb.load_font_data(PLACEHOLDER_FONT.to_vec());
    // fontdb 不做字体别名，generic sans-serif 需显式指向已加载的字体
    fontdb.set_sans_serif_family(PLACEHOLDER_FONT_FAMILY);
    Ok(usvg::Tree::from_str(svg, &opt)?)
}

/// 以 cover 方式将 SVG 直接渲染到 `size`x`size` 画布：短边铺满，长边居中裁剪
fn render_cover(tree: &usvg::Tree, size: u32) -> Result<RgbaImage, IconError> {
    let svg_size = tree.size();
    let (w, h) = (svg_size.width(), svg_size.height());
    let side = size as f32;
    let scale = (side / w).max(side / h);
    let tx = (side - w * scale) / 2.0;
    let ty = (side - h * scale) / 2.0;
    if !(scale.is_finite() && tx.is_finite() && ty.is_finite()) {
        return Err(IconError::Canvas(size, size));
    }

    let mut pixmap = tiny_skia::Pixmap::new(size, size).ok_or(IconError::Canvas(size, size))?;
    let transform = tiny_skia::Transform::from_scale(scale, scale).post_translate(tx, ty);
    resvg::render(tree, transform, &mut pixmap.as_mut());

    // tiny-skia 使用预乘 alpha，写入 image 前还原
    let mut img = RgbaImage::new(size, size);
    for (dst, px) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = px.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(img)
}

fn resize_all(src: &Source, out_dir: &Path) -> Result<Vec<PathBuf>, IconError> {
    let mut written = Vec::with_capacity(ICON_SPECS.len());
    for spec in ICON_SPECS {
        let out_path = out_dir.join(spec.file_name);
        let icon = match src {
            Source::Bitmap(img) => img.resize_to_fill(spec.size, spec.size, FilterType::Lanczos3),
            Source::Vector(tree) => DynamicImage::ImageRgba8(render_cover(tree, spec.size)?),
        };
        icon.save_with_format(&out_path, ImageFormat::Png)?;
        println!("   ✓ {} ({}x{})", spec.file_name, spec.size, spec.size);
        written.push(out_path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(path: &Path) -> (u32, u32) {
        image::image_dimensions(path).unwrap()
    }

    #[test]
    fn placeholder_produces_two_icons_and_no_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("icons");
        let written = generate_icons(None, &out, "Zebra", "#0ea5e9").unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(dims(&out.join("icon-192.png")), (192, 192));
        assert_eq!(dims(&out.join("icon-512.png")), (512, 512));
        assert!(!out.join(BASE_TEMP_NAME).exists());
        let names: Vec<_> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn placeholder_uses_theme_color_in_corner_gradient() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().to_path_buf();
        generate_icons(None, &out, "", "#ff0000").unwrap();
        let img = image::open(out.join("icon-512.png")).unwrap().to_rgba8();
        // 圆角外透明
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        // 左上区域接近主题色（红）
        let px = img.get_pixel(60, 60);
        assert!(px[0] > 200 && px[1] < 80, "unexpected pixel {:?}", px);
    }

    #[test]
    fn rectangular_source_is_cropped_not_stretched() {
        let tmp = tempfile::tempdir().unwrap();
        // 300x100：左 100 蓝、中 100 绿、右 100 红；cover 后只保留中间绿色
        let mut src = RgbaImage::new(300, 100);
        for (x, _, px) in src.enumerate_pixels_mut() {
            *px = match x {
                0..=99 => Rgba([0, 0, 255, 255]),
                100..=199 => Rgba([0, 255, 0, 255]),
                _ => Rgba([255, 0, 0, 255]),
            };
        }
        let src_path = tmp.path().join("wide.png");
        src.save(&src_path).unwrap();

        let out = tmp.path().join("icons");
        generate_icons(Some(src_path.as_path()), &out, "Wide", "#0ea5e9").unwrap();
        for (name, size) in [("icon-192.png", 192), ("icon-512.png", 512)] {
            let img = image::open(out.join(name)).unwrap().to_rgba8();
            assert_eq!(img.dimensions(), (size, size));
            let center = img.get_pixel(size / 2, size / 2);
            let edge = img.get_pixel(size / 8, size / 2);
            assert!(center[1] > 200 && center[0] < 50 && center[2] < 50);
            assert!(edge[1] > 200 && edge[0] < 50 && edge[2] < 50, "edge {:?}", edge);
        }
    }

    #[test]
    fn svg_source_is_rasterized() {
        let tmp = tempfile::tempdir().unwrap();
        let svg_path = tmp.path().join("logo.svg");
        fs::write(
            &svg_path,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="32"><rect width="64" height="32" fill="#00ff00"/></svg>"##,
        )
        .unwrap();
        let out = tmp.path().join("icons");
        generate_icons(Some(svg_path.as_path()), &out, "Svg", "#0ea5e9").unwrap();
        assert_eq!(dims(&out.join("icon-192.png")), (192, 192));
        let img = image::open(out.join("icon-192.png")).unwrap().to_rgba8();
        let px = img.get_pixel(96, 96);
        assert!(px[1] > 200 && px[3] == 255);
    }

    #[test]
    fn extreme_aspect_svg_is_cropped_at_target_size() {
        let tmp = tempfile::tempdir().unwrap();
        let svg_path = tmp.path().join("thin.svg");
        fs::write(
            &svg_path,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="100000"><rect width="1" height="100000" fill="#00ff00"/></svg>"##,
        )
        .unwrap();
        let out = tmp.path().join("icons");
        generate_icons(Some(svg_path.as_path()), &out, "Thin", "#0ea5e9").unwrap();
        for (name, size) in [("icon-192.png", 192), ("icon-512.png", 512)] {
            let img = image::open(out.join(name)).unwrap().to_rgba8();
            assert_eq!(img.dimensions(), (size, size));
            let px = img.get_pixel(size / 2, size / 2);
            assert!(px[1] > 200 && px[3] == 255, "center {:?}", px);
        }
    }

    fn white_pixels_near_center(img: &RgbaImage) -> usize {
        let (lo, hi) = (BASE_SIZE / 4, BASE_SIZE * 3 / 4);
        img.enumerate_pixels()
            .filter(|(x, y, _)| (lo..hi).contains(x) && (lo..hi).contains(y))
            .filter(|(_, _, p)| p[0] > 240 && p[1] > 240 && p[2] > 240 && p[3] > 240)
            .count()
    }

    #[test]
    fn placeholder_draws_initial_in_white() {
        let with_letter =
            render_cover(&parse_svg(&base_icon_svg("Z", "#0ea5e9")).unwrap(), BASE_SIZE).unwrap();
        let blank =
            render_cover(&parse_svg(&base_icon_svg("", "#0ea5e9")).unwrap(), BASE_SIZE).unwrap();
        assert_eq!(white_pixels_near_center(&blank), 0);
        assert!(white_pixels_near_center(&with_letter) > 1000);
    }

    #[test]
    fn missing_source_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.png");
        let err = generate_icons(Some(missing.as_path()), tmp.path(), "X", "#0ea5e9").unwrap_err();
        assert!(matches!(err, IconError::SourceNotFound(p) if p == missing));
    }

    #[test]
    fn svg_escapes_initial() {
        let svg = base_icon_svg("<", "#123456");
        assert!(svg.contains(">&lt;</text>"));
        assert!(svg.contains(r##"stop-color="#123456""##));
        assert!(svg.contains(r##"stop-color="#667eea""##));
        assert!(svg.contains(r#"font-family="DejaVu Sans, sans-serif""#));
    }
}
