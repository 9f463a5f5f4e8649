#![cfg(target_arch = "wasm32")]

use twig_dom::{children, h, props, tags::Namespace, web, web::WebDom, NodeRef, Renderer};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlInputElement};

wasm_bindgen_test_configure!(run_in_browser);


fn scratch() -> web_sys::Element {
	web_logging_::init();
	let document = window().unwrap().document().unwrap();
	let scratch = document.create_element("div").unwrap();
	document.body().unwrap().append_child(&scratch).unwrap();
	scratch
}

fn list(values: &[&'static str]) -> twig_dom::VNode {
	h(
		"ol",
		props! {},
		children![values.iter().map(|&value| h("li", props! { "key" => value }, children![value])).collect::<Vec<_>>()],
	)
}

#[wasm_bindgen_test]
fn keyed_reorder() {
	let scratch = scratch();

	web::render(list(&["a", "b", "c"]), &scratch);
	assert_eq!(scratch.inner_html(), "<ol><li>a</li><li>b</li><li>c</li></ol>");
	let ol = scratch.first_element_child().unwrap();
	let a = ol.first_child().unwrap();

	web::render(list(&["c", "b", "a"]), &scratch);
	assert_eq!(scratch.inner_html(), "<ol><li>c</li><li>b</li><li>a</li></ol>");
	assert_eq!(ol.last_child(), Some(a));

	web::render(list(&["b"]), &scratch);
	assert_eq!(scratch.inner_html(), "<ol><li>b</li></ol>");

	assert!(web::unmount(&scratch));
	assert_eq!(scratch.inner_html(), "");
}

#[wasm_bindgen_test]
fn attributes_and_properties() {
	let scratch = scratch();

	web::render(
		h(
			"div",
			props! { "class" => "box", "data-foo" => "databar" },
			children![
				h("o-checkbox", props! { "checked" => true }, children![]),
				h("input", props! { "type" => "password", "value" => "xyz" }, children![]),
			]
		),
		&scratch,
	);

	let div = scratch.first_element_child().unwrap();
	assert_eq!(div.class_name(), "box");
	assert_eq!(div.get_attribute("data-foo").as_deref(), Some("databar"));
	assert_eq!(div.first_element_child().unwrap().outer_html(), r#"<o-checkbox checked="true"></o-checkbox>"#);

	let input: HtmlInputElement = div.last_element_child().unwrap().dyn_into().unwrap();
	assert_eq!(input.outer_html(), r#"<input type="password">"#);
	assert_eq!(input.value(), "xyz");

	web::render(h("div", props! {}, children![]), &scratch);
	assert!(!div.has_attribute("class"));
	assert!(!div.has_attribute("data-foo"));

	web::unmount(&scratch);
}

#[wasm_bindgen_test]
fn svg_namespace() {
	let scratch = scratch();

	web::render(h("svg", props! {}, children![h("circle", props! { "r" => 5 }, children![])]), &scratch);

	let svg = scratch.first_element_child().unwrap();
	let circle = svg.first_element_child().unwrap();
	assert_eq!(svg.namespace_uri().as_deref(), Some(Namespace::SVG_URI));
	assert_eq!(circle.namespace_uri().as_deref(), Some(Namespace::SVG_URI));
	assert_eq!(circle.get_attribute("r").as_deref(), Some("5"));

	web::unmount(&scratch);
}

#[wasm_bindgen_test]
fn refs_with_an_owned_renderer() {
	let scratch = scratch();
	let container: web_sys::Node = scratch.clone().into();
	let renderer = Renderer::new(WebDom::for_window().unwrap());
	let r = NodeRef::new();

	renderer.render(h("p", props! { "ref" => r.clone() }, children!["text"]), &container);
	assert_eq!(r.get::<web_sys::Node>(), scratch.first_child());

	assert!(renderer.unmount(&container));
	assert!(!r.is_set());
	assert_eq!(scratch.child_element_count(), 0);
}
