use axum::response::Html;

pub async fn index() -> Html<&'static str> {
	Html("<h1>Awesome</h1>")
}

pub async fn article() -> Html<&'static str> {
	Html("<h2>Article</h2><br><h1>Title title title</h1>")
}
