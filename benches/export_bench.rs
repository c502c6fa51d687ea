use criterion::{criterion_group, criterion_main, Criterion};

use entrypass::assets::ResolvedAssets;
use entrypass::card::{AssetPreviews, CardRecord, CardView};
use entrypass::encode::encode_png;
use entrypass::fonts::FontBook;
use entrypass::pdf;
use entrypass::rendering::paint::compose_sheet;
use entrypass::rendering::raster::{rasterize, RasterOptions};
use entrypass::ExportConfig;

fn sample_record() -> CardRecord {
    CardRecord {
        id: Some("abc123".into()),
        employee_name: "Ravi Kumar".into(),
        blood_group: "B+".into(),
        mobile_number: "9876543210".into(),
        division_name: "NWR JP".into(),
        profile_name: "Mega Rail Services".into(),
        ..Default::default()
    }
}

fn bench_compose_sheet(c: &mut Criterion) {
    let config = ExportConfig::default();
    let record = sample_record();
    let view = CardView::new(&record, &AssetPreviews::default());

    c.bench_function("compose_sheet", |b| {
        b.iter(|| {
            let _ = compose_sheet(&view, &config).unwrap();
        })
    });
}

fn bench_rasterize_3x(c: &mut Criterion) {
    let config = ExportConfig::default();
    let record = sample_record();
    let view = CardView::new(&record, &AssetPreviews::default());
    let scene = compose_sheet(&view, &config).unwrap();
    let fonts = FontBook::empty();

    c.bench_function("rasterize_3x", |b| {
        b.iter(|| {
            let _ = rasterize(
                &scene,
                &ResolvedAssets::default(),
                &fonts,
                RasterOptions::default(),
            )
            .unwrap();
        })
    });
}

fn bench_encode_and_compose_pdf(c: &mut Criterion) {
    let config = ExportConfig::default();
    let record = sample_record();
    let view = CardView::new(&record, &AssetPreviews::default());
    let scene = compose_sheet(&view, &config).unwrap();
    let raster = rasterize(
        &scene,
        &ResolvedAssets::default(),
        &FontBook::empty(),
        RasterOptions::default(),
    )
    .unwrap();

    c.bench_function("encode_png", |b| {
        b.iter(|| {
            let _ = encode_png(&raster).unwrap();
        })
    });

    let encoded = encode_png(&raster).unwrap();
    c.bench_function("compose_pdf", |b| {
        b.iter(|| {
            let spec =
                pdf::page_spec(pdf::PageLayout::default(), encoded.width, encoded.height).unwrap();
            let _ = pdf::compose(&encoded, &spec).unwrap();
        })
    });
}

criterion_group!(
    benches,
    bench_compose_sheet,
    bench_rasterize_3x,
    bench_encode_and_compose_pdf
);
criterion_main!(benches);
