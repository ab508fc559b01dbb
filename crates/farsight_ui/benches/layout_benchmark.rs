//! Benchmark for binding, layout and paint over a repeated list.
//!
//! Run with: cargo bench --package farsight_ui --bench layout_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use farsight_shared::{Object, ObjectId, ObjectRef, PropertyId, PropertyName, Rect, ResourceId, SizeDef, Value, WidgetType};
use farsight_ui::{FixedMetrics, LayoutWriter, LocalContext, RecordingPainter, Resource, WidgetTree};

const ITEMS: PropertyName = PropertyName(1);
const CAPTION: PropertyName = PropertyName(2);
const ITEM_COUNT: u32 = 500;

fn create_session() -> (LocalContext, WidgetTree) {
    let mut ctx = LocalContext::new();

    let mut row = LayoutWriter::new();
    row.begin(WidgetType::Stack)
        .property(PropertyId::Orientation, Value::Enumeration(17))
        .begin(WidgetType::Label)
        .binding(PropertyId::Text, CAPTION)
        .end()
        .begin(WidgetType::Button)
        .end();
    ctx.insert_resource(ResourceId(2), Resource::Layout(row.finish()));

    let mut view = LayoutWriter::new();
    view.begin(WidgetType::Grid)
        .property(PropertyId::Columns, Value::SizeList(vec![SizeDef::Expand, SizeDef::Expand, SizeDef::Pixels(120)]))
        .property(PropertyId::ChildTemplate, Value::Resource(ResourceId(2)))
        .binding(PropertyId::ChildSource, ITEMS);
    ctx.insert_resource(ResourceId(1), Resource::Layout(view.finish()));

    let ids: Vec<ObjectId> = (0..ITEM_COUNT).map(|i| ObjectId(100 + i)).collect();
    for &id in &ids {
        let mut item = Object::new(id);
        item.add_value(CAPTION, Value::from(format!("row {}", id.raw()))).unwrap();
        ctx.objects.add_or_update(item);
    }
    let mut root = Object::new(ObjectId(1));
    root.add_value(ITEMS, Value::object_list(ids)).unwrap();
    ctx.objects.add_or_update(root);

    let mut tree = WidgetTree::new();
    let view = tree.instantiate(&ctx, ResourceId(1)).unwrap();
    tree.set_root(Some(view));
    tree.update_bindings(&ctx, ObjectRef::new(ObjectId(1)));
    (ctx, tree)
}

fn benchmark_layout(c: &mut Criterion) {
    let (mut ctx, mut tree) = create_session();
    let screen = Rect::new(0, 0, 1280, 720);
    let metrics = FixedMetrics::default();

    c.bench_function("bindings_500_rows", |b| {
        b.iter(|| tree.update_bindings(&ctx, black_box(ObjectRef::new(ObjectId(1)))));
    });

    c.bench_function("layout_500_rows", |b| {
        b.iter(|| tree.update_layout(&mut ctx, &metrics, black_box(screen)));
    });

    let mut painter = RecordingPainter::new(screen);
    c.bench_function("paint_500_rows", |b| {
        b.iter(|| {
            painter.begin_frame();
            tree.paint(&ctx, &mut painter);
            black_box(painter.command_count())
        });
    });
}

criterion_group!(benches, benchmark_layout);
criterion_main!(benches);
