use crate::domain::model::{
    DashboardOptions, DashboardReport, DataOrigin, DateRange, FitMethod, StudyView, ClimateView,
    MAX_SMOOTHING_WINDOW,
};
use crate::domain::query::DashboardQuery;
use crate::render::chart::{date_to_x, Chart, Mark, Series, XAxis, PALETTE};
use crate::render::export::{CLIMATE_CSV, STUDY_CSV};
use crate::render::{escape_html, format_metric, FONT_ASSET, FONT_FAMILY};
use crate::sources::DEFAULT_NOAA_ENDPOINT;
use std::fmt::Write;

pub const PAGE_TITLE: &str = "🌡️ 기후 변화와 학업 성취 대시보드";
pub const FALLBACK_WARNING: &str = "⚠️ NOAA API 호출 실패 → 예시 데이터 사용 중입니다.";

/// Static pages link to files next to them; live pages link back to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    Static,
    Live,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFace {
    pub family: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct RenderContext {
    pub mode: PageMode,
    pub font: Option<FontFace>,
}

impl RenderContext {
    /// Uses the custom font only when the file is actually there.
    pub fn detect(mode: PageMode, font_path: &str) -> Self {
        let font = std::path::Path::new(font_path).is_file().then(|| FontFace {
            family: FONT_FAMILY.to_string(),
            url: match mode {
                PageMode::Static => FONT_ASSET.to_string(),
                PageMode::Live => format!("/{}", FONT_ASSET),
            },
        });
        Self { mode, font }
    }

    fn font_family(&self) -> Option<String> {
        self.font.as_ref().map(|f| f.family.clone())
    }

    fn download_href(&self, file: &str, query: &str) -> String {
        match self.mode {
            PageMode::Static => file.to_string(),
            PageMode::Live => format!("/download/{}?{}", file, query),
        }
    }
}

const STYLE: &str = r#"
body { margin: 0; font-family: var(--font), -apple-system, "Segoe UI", sans-serif; color: #262730; }
.layout { display: flex; min-height: 100vh; }
aside { width: 300px; background: #f0f2f6; padding: 1.5rem; box-sizing: border-box; }
aside label { display: block; margin-top: .75rem; font-size: .9rem; }
aside input[type=date], aside input[type=range] { width: 100%; }
main { flex: 1; padding: 1.5rem 3rem; min-width: 0; }
.tabs > input { display: none; }
.tabs > label { display: inline-block; padding: .5rem 1rem; cursor: pointer; border-bottom: 2px solid transparent; }
.tabs > input:checked + label { border-bottom-color: #ff4b4b; color: #ff4b4b; }
.panel { display: none; padding-top: 1rem; }
#tab-noaa:checked ~ #panel-noaa, #tab-study:checked ~ #panel-study { display: block; }
.metrics { display: flex; gap: 2rem; }
.metric .label { font-size: .9rem; color: #555; }
.metric .value { font-size: 2rem; }
.banner { padding: .75rem 1rem; border-radius: .5rem; margin: .5rem 0; }
.banner.warning { background: #fffce7; color: #926c05; }
.banner.error { background: #ffecec; color: #7d353b; }
.banner.info { background: #e8f0fe; color: #1c4f9c; }
.chart { width: 100%; height: auto; }
.download { display: inline-block; padding: .4rem .9rem; border: 1px solid #ccc; border-radius: .5rem; text-decoration: none; color: inherit; }
.caption { font-size: .85rem; color: #666; }
"#;

fn metric(label: &str, value: &str) -> String {
    format!(
        r#"<div class="metric"><div class="label">{}</div><div class="value">{}</div></div>"#,
        escape_html(label),
        escape_html(value)
    )
}

fn date_input(label: &str, name: &str, value: Option<DateRange>, pick_end: bool, bounds: Option<DateRange>, disabled: &str) -> String {
    let value = value.map(|r| if pick_end { r.end } else { r.start });
    format!(
        r#"<label>{label}<input type="date" name="{name}" value="{value}" min="{min}" max="{max}"{disabled}></label>"#,
        label = escape_html(label),
        name = name,
        value = value.map(|d| d.to_string()).unwrap_or_default(),
        min = bounds.map(|b| b.start.to_string()).unwrap_or_default(),
        max = bounds.map(|b| b.end.to_string()).unwrap_or_default(),
        disabled = disabled,
    )
}

fn sidebar(report: &DashboardReport, ctx: &RenderContext) -> String {
    let disabled = match ctx.mode {
        PageMode::Static => " disabled",
        PageMode::Live => "",
    };
    let climate = &report.climate;
    let study = &report.study;
    let options = &report.options;

    let mut out = String::from(r#"<aside><form method="get" action="/">"#);
    out.push_str("<h3>NOAA 데이터 옵션</h3><p class=\"caption\">NOAA 기간 선택</p>");
    out.push_str(&date_input("시작", "noaa_start", climate.range, false, climate.bounds, disabled));
    out.push_str(&date_input("종료", "noaa_end", climate.range, true, climate.bounds, disabled));

    out.push_str("<h3>사용자 데이터 옵션</h3><p class=\"caption\">사용자 데이터 기간 선택</p>");
    out.push_str(&date_input("시작", "study_start", study.range, false, study.bounds, disabled));
    out.push_str(&date_input("종료", "study_end", study.range, true, study.bounds, disabled));
    let _ = write!(
        out,
        r#"<label title="0이면 스무딩 미적용">이동평균 윈도우: {window}<input type="range" name="window" min="0" max="{max}" value="{window}"{disabled}></label>"#,
        window = options.smoothing_window,
        max = MAX_SMOOTHING_WINDOW,
        disabled = disabled,
    );
    let _ = write!(
        out,
        r#"<label><input type="checkbox" name="standardize" value="on"{checked}{disabled}> 수학 점수 표준화(Z-score)</label>"#,
        checked = if options.standardize { " checked" } else { "" },
        disabled = disabled,
    );

    match ctx.mode {
        PageMode::Live => out.push_str(r#"<p><button type="submit">적용</button></p>"#),
        PageMode::Static => out.push_str(
            r#"<p class="caption">정적 페이지입니다. 옵션을 바꾸려면 --serve 모드로 실행하세요.</p>"#,
        ),
    }
    out.push_str("</form></aside>");
    out
}

fn climate_panel(view: &ClimateView, ctx: &RenderContext, query: &str) -> String {
    let font = ctx.font_family();
    let mut out = String::from(r#"<section class="panel" id="panel-noaa">"#);
    out.push_str("<h2>🌍 NOAA 공개 데이터: 전 지구 해수면 온도 이상치</h2>");
    if view.used_fallback {
        let _ = write!(out, r#"<div class="banner warning">{}</div>"#, FALLBACK_WARNING);
    }

    let _ = write!(
        out,
        r#"<div class="metrics">{}{}</div>"#,
        metric("평균 이상치 (°C)", &format_metric(view.mean, 3)),
        metric("표준편차 (°C)", &format_metric(view.std_dev, 3))
    );

    let value_chart = Chart {
        x_axis: XAxis::Date,
        x_label: "날짜".to_string(),
        y_label: "온도 이상치 (°C)".to_string(),
        series: vec![Series {
            name: "value".to_string(),
            color: PALETTE[0],
            mark: Mark::Line,
            points: view.rows.iter().map(|r| (date_to_x(r.date), Some(r.value))).collect(),
        }],
        font_family: font.clone(),
    };
    let _ = write!(out, "<h3>📈 시계열 추세</h3>{}", value_chart.render());

    let ma_chart = Chart {
        x_axis: XAxis::Date,
        x_label: "날짜".to_string(),
        y_label: "12개월 이동평균 (°C)".to_string(),
        series: vec![Series {
            name: "MA12".to_string(),
            color: PALETTE[0],
            mark: Mark::Line,
            points: view.rows.iter().map(|r| (date_to_x(r.date), r.ma12)).collect(),
        }],
        font_family: font,
    };
    let _ = write!(out, "<h3>📊 12개월 이동평균</h3>{}", ma_chart.render());

    let _ = write!(
        out,
        r#"<p><a class="download" href="{}" download="{}">📥 NOAA 데이터 다운로드</a></p>"#,
        escape_html(&ctx.download_href(CLIMATE_CSV, query)),
        CLIMATE_CSV
    );
    out.push_str("</section>");
    out
}

fn trend_caption(view: &StudyView) -> Option<String> {
    let line = view.trend.trendline?;
    let method = match line.method {
        FitMethod::Ols => "OLS",
        FitMethod::Polyfit => "Polyfit",
    };
    let mut caption = format!("{} 추세선: y = {:.3}x + {:.3}", method, line.slope, line.intercept);
    if let Some(r2) = line.r_squared {
        let _ = write!(caption, ", R² = {:.3}", r2);
    }
    Some(caption)
}

fn study_panel(view: &StudyView, ctx: &RenderContext, query: &str) -> String {
    let font = ctx.font_family();
    let mut out = String::from(r#"<section class="panel" id="panel-study">"#);
    out.push_str("<h2>📚 사용자 연구 데이터: 기온과 학업 성취</h2>");
    if let DataOrigin::UserFile { path } = &view.origin {
        let _ = write!(out, r#"<div class="banner info">데이터 파일: {}</div>"#, escape_html(path));
    }

    let _ = write!(
        out,
        r#"<div class="metrics">{}{}</div>"#,
        metric("평균 여름 기온 (°C)", &format_metric(view.mean_temp, 2)),
        metric("평균 수학 점수", &format_metric(view.mean_score, 2))
    );

    let timeline = Chart {
        x_axis: XAxis::Date,
        x_label: "연도".to_string(),
        y_label: "값".to_string(),
        series: vec![
            Series {
                name: "summer_avg_temp_C".to_string(),
                color: PALETTE[0],
                mark: Mark::Line,
                points: view
                    .rows
                    .iter()
                    .map(|r| (date_to_x(r.date), Some(r.summer_avg_temp_c)))
                    .collect(),
            },
            Series {
                name: "math_score".to_string(),
                color: PALETTE[1],
                mark: Mark::Line,
                points: view.rows.iter().map(|r| (date_to_x(r.date), r.math_score)).collect(),
            },
        ],
        font_family: font.clone(),
    };
    let _ = write!(out, "<h3>📈 연도별 수학 점수 및 여름 평균 기온</h3>{}", timeline.render());

    let mut scatter_series = vec![Series {
        name: "math_score".to_string(),
        color: PALETTE[0],
        mark: Mark::Markers,
        points: view
            .rows
            .iter()
            .map(|r| (r.summer_avg_temp_c, r.math_score))
            .collect(),
    }];
    if let Some(line) = view.trend.trendline {
        let xs = view
            .rows
            .iter()
            .filter(|r| r.math_score.is_some())
            .map(|r| r.summer_avg_temp_c);
        let (lo, hi) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)));
        if lo.is_finite() && hi.is_finite() {
            scatter_series.push(Series {
                name: "trendline".to_string(),
                color: PALETTE[1],
                mark: Mark::Line,
                points: vec![(lo, Some(line.evaluate(lo))), (hi, Some(line.evaluate(hi)))],
            });
        }
    }
    let scatter = Chart {
        x_axis: XAxis::Numeric,
        x_label: "여름 평균기온 (°C)".to_string(),
        y_label: "수학 점수".to_string(),
        series: scatter_series,
        font_family: font,
    };

    out.push_str("<h3>📊 기온 vs 수학 점수</h3>");
    if let Some(notice) = &view.trend.notice {
        let _ = write!(out, r#"<div class="banner error">{}</div>"#, escape_html(notice));
    }
    out.push_str(&scatter.render());
    if let Some(caption) = trend_caption(view) {
        let _ = write!(out, r#"<p class="caption">{}</p>"#, escape_html(&caption));
    }

    let _ = write!(
        out,
        r#"<div class="metrics">{}</div>"#,
        metric("여름 평균기온 vs 수학 점수 상관계수", &format_metric(view.correlation, 3))
    );
    let _ = write!(
        out,
        r#"<p><a class="download" href="{}" download="{}">📥 사용자 데이터 다운로드</a></p>"#,
        escape_html(&ctx.download_href(STUDY_CSV, query)),
        STUDY_CSV
    );
    out.push_str("</section>");
    out
}

fn references() -> String {
    format!(
        r#"<hr><h3>📚 참고 출처</h3><ul>
<li>NOAA, <a href="{url}">GHCN Monthly Anomalies</a></li>
<li>Park, R. J., &amp; Goodman, J. (2023). <em>Heat and Learning</em>. PLOS Climate.</li>
<li>OECD PISA 데이터 및 학업 성취도 연구</li>
<li>기상청 기후자료개방포털</li>
</ul>"#,
        url = DEFAULT_NOAA_ENDPOINT
    )
}

/// Links carry the effective (clamped) windows, not the raw request.
fn effective_query(report: &DashboardReport) -> String {
    let effective = DashboardOptions {
        climate_range: report.climate.range,
        study_range: report.study.range,
        ..report.options
    };
    DashboardQuery::from_options(&effective).to_query_string()
}

pub fn render_dashboard(report: &DashboardReport, ctx: &RenderContext) -> String {
    let query = effective_query(report);

    let font_css = match &ctx.font {
        Some(font) => format!(
            "@font-face {{ font-family: '{family}'; src: url('{url}') format('truetype'); }}\n:root {{ --font: '{family}'; }}\n",
            family = escape_html(&font.family),
            url = escape_html(&font.url)
        ),
        None => ":root { --font: system-ui; }\n".to_string(),
    };

    let mut page = String::new();
    let _ = write!(
        page,
        r#"<!DOCTYPE html>
<html lang="ko">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
{font_css}{style}</style>
</head>
<body>
<div class="layout">
{sidebar}
<main>
<h1>{title}</h1>
<div class="tabs">
<input type="radio" name="tab" id="tab-noaa" checked><label for="tab-noaa">① NOAA 데이터</label>
<input type="radio" name="tab" id="tab-study"><label for="tab-study">② 사용자 연구 데이터</label>
{climate}
{study}
</div>
{references}
<p class="caption">생성 시각: {generated}</p>
</main>
</div>
</body>
</html>
"#,
        title = PAGE_TITLE,
        font_css = font_css,
        style = STYLE,
        sidebar = sidebar(report, ctx),
        climate = climate_panel(&report.climate, ctx, &query),
        study = study_panel(&report.study, ctx, &query),
        references = references(),
        generated = report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::build_report;
    use crate::domain::model::{AnomalyPoint, ClimateSeries, RawData, StudyDataset, StudyRecord};
    use crate::analysis::regression::FALLBACK_NOTICE;
    use chrono::{NaiveDate, Utc};

    fn raw(fallback: bool) -> RawData {
        let d = |y: i32, m: u32| NaiveDate::from_ymd_opt(y, m, 1).unwrap();
        RawData {
            climate: ClimateSeries {
                points: (1..=12).map(|m| AnomalyPoint { date: d(2010, m), value: m as f64 / 10.0 }).collect(),
                origin: if fallback {
                    DataOrigin::Fallback { reason: "down".to_string() }
                } else {
                    DataOrigin::Live { endpoint: "http://noaa".to_string() }
                },
            },
            study: StudyDataset {
                records: (0..5)
                    .map(|i| StudyRecord {
                        date: d(2000 + i, 1),
                        summer_avg_temp_c: 22.0 + i as f64 * 0.2,
                        math_score: 500.0 - i as f64,
                    })
                    .collect(),
                origin: DataOrigin::UserFile { path: "<study>.csv".to_string() },
            },
        }
    }

    fn ctx(mode: PageMode) -> RenderContext {
        RenderContext { mode, font: None }
    }

    #[test]
    fn test_page_has_both_tabs_and_metrics() {
        let report = build_report(&raw(false), &DashboardOptions::default(), Utc::now()).unwrap();
        let page = render_dashboard(&report, &ctx(PageMode::Static));
        assert!(page.contains(PAGE_TITLE));
        assert!(page.contains("① NOAA 데이터"));
        assert!(page.contains("② 사용자 연구 데이터"));
        assert!(page.contains("평균 이상치 (°C)"));
        assert!(page.contains("0.650"));
        assert!(page.contains("평균 수학 점수"));
        assert!(page.contains("498.00"));
        assert!(!page.contains(FALLBACK_WARNING));
        assert!(page.contains(r#"href="noaa_data.csv""#));
        assert!(page.contains("&lt;study&gt;.csv"));
        assert!(page.contains(" disabled"));
    }

    #[test]
    fn test_fallback_warning_shown() {
        let report = build_report(&raw(true), &DashboardOptions::default(), Utc::now()).unwrap();
        let page = render_dashboard(&report, &ctx(PageMode::Static));
        assert!(page.contains(FALLBACK_WARNING));
    }

    #[test]
    fn test_live_links_carry_query() {
        let options = DashboardOptions {
            smoothing_window: 2,
            ..Default::default()
        };
        let report = build_report(&raw(false), &options, Utc::now()).unwrap();
        let page = render_dashboard(&report, &ctx(PageMode::Live));
        assert!(page.contains("/download/user_data.csv?noaa_start=2010-01-01&amp;noaa_end=2010-12-01"));
        assert!(page.contains("window=2"));
        assert!(page.contains("적용"));
    }

    #[test]
    fn test_fallback_fit_shows_error_banner() {
        let options = DashboardOptions {
            study_range: Some(DateRange::new(
                NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
            )),
            ..Default::default()
        };
        let report = build_report(&raw(false), &options, Utc::now()).unwrap();
        let page = render_dashboard(&report, &ctx(PageMode::Static));
        assert!(page.contains(FALLBACK_NOTICE));
        assert!(page.contains("Polyfit 추세선"));
    }

    #[test]
    fn test_font_face_only_when_present() {
        let missing = RenderContext::detect(PageMode::Static, "/definitely/not/here.ttf");
        assert!(missing.font.is_none());

        let dir = tempfile::tempdir().unwrap();
        let font_path = dir.path().join("Pretendard-Bold.ttf");
        std::fs::write(&font_path, b"font").unwrap();
        let found = RenderContext::detect(PageMode::Live, font_path.to_str().unwrap());
        assert_eq!(found.font.as_ref().unwrap().url, "/fonts/Pretendard.ttf");

        let report = build_report(&raw(false), &DashboardOptions::default(), Utc::now()).unwrap();
        let page = render_dashboard(&report, &found);
        assert!(page.contains("@font-face { font-family: 'Pretendard'"));
    }
}
