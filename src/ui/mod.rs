//! Browser chat page.
//!
//! The page is a single self-contained document: markup, styles and the
//! streaming client script are inlined, so the relay serves it without any
//! static asset directory.

use axum::response::{Html, IntoResponse};

use crate::client::DEFAULT_TIMEOUT;
use crate::relay::MAX_PROMPT_CHARS;

/// Index page handler.
pub async fn index_handler() -> impl IntoResponse {
    Html(html_shell("Weather Chat Assistant"))
}

fn html_shell(title: &str) -> String {
    PAGE.replace("__TITLE__", title)
        .replace("__MAX_PROMPT__", &MAX_PROMPT_CHARS.to_string())
        .replace("__TIMEOUT_MS__", &DEFAULT_TIMEOUT.as_millis().to_string())
}

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Chat with a weather agent">
    <title>__TITLE__</title>
    <style>
        :root {
            --bg: #eef2ff; --surface: #ffffff; --border: #e5e7eb;
            --text: #1f2937; --muted: #6b7280; --accent: #4f46e5; --danger: #dc2626;
        }
        html.dark {
            --bg: #111827; --surface: #1f2937; --border: #374151;
            --text: #f3f4f6; --muted: #9ca3af; --accent: #6366f1; --danger: #f87171;
        }
        * { box-sizing: border-box; }
        body { margin: 0; font-family: system-ui, sans-serif; background: var(--bg); color: var(--text); }
        main { max-width: 56rem; margin: 0 auto; padding: 1rem; display: flex; flex-direction: column; height: 100vh; }
        header { display: flex; align-items: center; justify-content: space-between; gap: .5rem; }
        header h1 { font-size: 1.5rem; margin: .25rem 0; }
        .tools { display: flex; gap: .25rem; }
        button { cursor: pointer; border: 1px solid var(--border); background: var(--surface); color: var(--text); border-radius: .5rem; padding: .4rem .7rem; }
        button:disabled { opacity: .5; cursor: not-allowed; }
        button.primary { background: var(--accent); color: #fff; border-color: var(--accent); }
        #search { display: none; width: 100%; margin: .5rem 0; padding: .5rem; border-radius: .5rem; border: 1px solid var(--border); background: var(--surface); color: var(--text); }
        #search.visible { display: block; }
        #messages { flex: 1; overflow-y: auto; background: var(--surface); border: 1px solid var(--border); border-radius: 1rem; padding: 1rem; }
        .empty { text-align: center; color: var(--muted); margin-top: 4rem; }
        .empty button { margin: .25rem; }
        .msg { display: flex; margin-bottom: .75rem; }
        .msg.user { justify-content: flex-end; }
        .bubble { max-width: 75%; padding: .6rem .9rem; border-radius: 1rem; white-space: pre-wrap; word-break: break-word; }
        .user .bubble { background: var(--accent); color: #fff; border-bottom-right-radius: 0; }
        .agent .bubble { background: var(--bg); border: 1px solid var(--border); border-bottom-left-radius: 0; }
        .meta { display: flex; gap: .5rem; align-items: center; font-size: .7rem; opacity: .7; margin-top: .3rem; }
        .meta button { padding: 0 .3rem; font-size: .7rem; }
        .dots span { display: inline-block; width: .4rem; height: .4rem; margin-right: .2rem; border-radius: 50%; background: var(--accent); animation: bounce 1s infinite; }
        .dots span:nth-child(2) { animation-delay: .15s; }
        .dots span:nth-child(3) { animation-delay: .3s; }
        @keyframes bounce { 50% { transform: translateY(-4px); } }
        #error { display: none; margin-top: .5rem; padding: .6rem .9rem; border-radius: .5rem; border: 1px solid var(--danger); color: var(--danger); }
        #error.visible { display: flex; justify-content: space-between; align-items: center; }
        form { display: flex; gap: .5rem; margin-top: .5rem; }
        textarea { flex: 1; resize: none; padding: .6rem; border-radius: .5rem; border: 1px solid var(--border); background: var(--surface); color: var(--text); font: inherit; }
        #counter { font-size: .75rem; color: var(--muted); text-align: right; }
        #counter.near { color: var(--danger); }
    </style>
</head>
<body>
<main>
    <header>
        <div>
            <h1>__TITLE__ ⛅</h1>
            <div style="color: var(--muted); font-size: .9rem">Ask about current conditions or forecasts anywhere.</div>
        </div>
        <div class="tools">
            <button id="search-toggle" title="Search">🔍</button>
            <button id="export" title="Export Chat">⬇</button>
            <button id="clear" title="Clear Chat">🗑</button>
            <button id="theme" title="Toggle theme">🌓</button>
        </div>
    </header>
    <input id="search" type="search" placeholder="Search messages...">
    <section id="messages"></section>
    <div id="error"><span id="error-text"></span><button id="retry">Retry</button></div>
    <form id="composer">
        <textarea id="input" rows="2" maxlength="__MAX_PROMPT__" placeholder="Ask about the weather..."></textarea>
        <button id="send" class="primary" type="submit" disabled>Send</button>
    </form>
    <div id="counter">0/__MAX_PROMPT__</div>
</main>
<script>
(() => {
    const MAX_PROMPT = __MAX_PROMPT__;
    const TIMEOUT_MS = __TIMEOUT_MS__;
    const SUGGESTIONS = ["What's the weather in New York?", "Will it rain tomorrow in Tokyo?"];
    const ICONS = [
        [["sunny", "clear"], "☀️"], [["rain", "drizzle"], "🌧️"], [["cloud"], "☁️"],
        [["snow"], "❄️"], [["thunder"], "⚡"], [["wind", "breeze"], "💨"], [["mist", "fog"], "🌫️"],
    ];

    const state = { messages: [], loading: null, error: null, lastPrompt: "", query: "" };
    const $ = (id) => document.getElementById(id);

    async function sendMessageToAgent(prompt, onChunk) {
        const controller = new AbortController();
        const timer = setTimeout(() => controller.abort(), TIMEOUT_MS);
        try {
            const response = await fetch("/api/chat", {
                method: "POST",
                headers: { "Content-Type": "application/json" },
                body: JSON.stringify({ prompt }),
                signal: controller.signal,
            });
            if (!response.ok) {
                if (response.status === 500) throw new Error("Server error. Please try again later.");
                if (response.status === 429) throw new Error("Too many requests. Please wait a moment and try again.");
                if (response.status === 404) throw new Error("Service not found. Please contact support.");
                const data = await response.json().catch(() => ({}));
                throw new Error(data.error || `Error: ${response.status}`);
            }
            const reader = response.body.getReader();
            const decoder = new TextDecoder();
            let full = "";
            const emit = (text) => { if (text) { full += text; onChunk(text); } };
            for (;;) {
                const { done, value } = await reader.read();
                if (done) break;
                emit(decoder.decode(value, { stream: true }));
            }
            emit(decoder.decode());
            if (full.trim().length === 0) throw new Error("Received empty response from server.");
            return full;
        } catch (err) {
            if (err.name === "AbortError") throw new Error("Request timeout. The server took too long to respond.");
            if (err instanceof TypeError) throw new Error("Network error. Please check your internet connection.");
            throw err;
        } finally {
            clearTimeout(timer);
        }
    }

    function weatherIcon(msg) {
        if (msg.role !== "agent") return "";
        const text = msg.content.toLowerCase();
        const hit = ICONS.find(([words]) => words.some((w) => text.includes(w)));
        return hit ? hit[1] + " " : "";
    }

    function render() {
        const list = $("messages");
        list.replaceChildren();
        const q = state.query.toLowerCase();
        const visible = q ? state.messages.filter((m) => m.content.toLowerCase().includes(q)) : state.messages;

        if (state.messages.length === 0) {
            const empty = document.createElement("div");
            empty.className = "empty";
            empty.innerHTML = "<p>Start a conversation!</p>";
            for (const s of SUGGESTIONS) {
                const b = document.createElement("button");
                b.textContent = s;
                b.onclick = () => send(s);
                empty.appendChild(b);
            }
            list.appendChild(empty);
        } else if (visible.length === 0) {
            const none = document.createElement("div");
            none.className = "empty";
            none.textContent = `No messages found matching "${state.query}"`;
            list.appendChild(none);
        }

        for (const m of visible) {
            const row = document.createElement("div");
            row.className = `msg ${m.role}`;
            const bubble = document.createElement("div");
            bubble.className = "bubble";
            const body = document.createElement("div");
            body.textContent = weatherIcon(m) + m.content;
            bubble.appendChild(body);
            if (state.loading === m.id) {
                const dots = document.createElement("div");
                dots.className = "dots";
                dots.innerHTML = "<span></span><span></span><span></span>";
                bubble.appendChild(dots);
            } else {
                const meta = document.createElement("div");
                meta.className = "meta";
                const time = document.createElement("span");
                time.textContent = m.timestamp.toLocaleTimeString("en-US", { hour: "2-digit", minute: "2-digit" });
                const copy = document.createElement("button");
                copy.textContent = "Copy";
                copy.onclick = () => navigator.clipboard.writeText(m.content).then(() => {
                    copy.textContent = "Copied";
                    setTimeout(() => (copy.textContent = "Copy"), 1500);
                });
                meta.append(time, copy);
                bubble.appendChild(meta);
            }
            row.appendChild(bubble);
            list.appendChild(row);
        }

        $("error").classList.toggle("visible", !!state.error);
        $("error-text").textContent = state.error || "";
        $("retry").disabled = !state.lastPrompt || !!state.loading;
        $("send").disabled = !!state.loading || $("input").value.trim() === "";
        list.scrollTop = list.scrollHeight;
    }

    async function send(content) {
        if (!content || content.trim() === "") {
            state.error = "Please enter a message before sending.";
            return render();
        }
        if (content.trim().length > MAX_PROMPT) {
            state.error = `Message is too long. Please keep it under ${MAX_PROMPT} characters.`;
            return render();
        }
        if (state.loading) return;

        state.error = null;
        state.lastPrompt = content;
        const now = Date.now();
        state.messages.push({ id: `${now}`, role: "user", content, timestamp: new Date() });
        const agent = { id: `${now + 1}`, role: "agent", content: "", timestamp: new Date() };
        state.messages.push(agent);
        state.loading = agent.id;
        render();

        try {
            await sendMessageToAgent(content, (chunk) => {
                agent.content += chunk;
                render();
            });
        } catch (err) {
            state.messages = state.messages.filter((m) => m.id !== agent.id);
            state.error = err.message || "Failed to get a response. Please try again.";
        } finally {
            state.loading = null;
            render();
        }
    }

    function exportChat() {
        if (state.messages.length === 0) return;
        const text = state.messages
            .map((m) => `[${m.timestamp.toLocaleString()}] ${m.role.toUpperCase()}: ${m.content}`)
            .join("\n\n");
        const url = URL.createObjectURL(new Blob([text], { type: "text/plain" }));
        const a = document.createElement("a");
        a.href = url;
        a.download = `weather-chat-${new Date().toISOString().split("T")[0]}.txt`;
        document.body.appendChild(a);
        a.click();
        a.remove();
        URL.revokeObjectURL(url);
    }

    function applyTheme(theme) {
        document.documentElement.classList.toggle("dark", theme === "dark");
        localStorage.setItem("theme", theme);
    }

    const saved = localStorage.getItem("theme")
        || (matchMedia("(prefers-color-scheme: dark)").matches ? "dark" : "light");
    applyTheme(saved);

    $("theme").onclick = () =>
        applyTheme(document.documentElement.classList.contains("dark") ? "light" : "dark");
    $("search-toggle").onclick = () => {
        $("search").classList.toggle("visible");
        $("search").focus();
    };
    $("search").oninput = (e) => { state.query = e.target.value; render(); };
    $("export").onclick = exportChat;
    $("clear").onclick = () => {
        if (state.messages.length === 0) return;
        if (!confirm("Are you sure you want to clear the chat history?")) return;
        state.messages = [];
        state.error = null;
        state.lastPrompt = "";
        render();
    };
    $("retry").onclick = () => state.lastPrompt && send(state.lastPrompt);
    $("input").oninput = (e) => {
        const len = e.target.value.length;
        $("counter").textContent = `${len}/${MAX_PROMPT}`;
        $("counter").classList.toggle("near", len > MAX_PROMPT * 0.9);
        render();
    };
    $("input").onkeydown = (e) => {
        if (e.key === "Enter" && !e.shiftKey) {
            e.preventDefault();
            $("composer").requestSubmit();
        }
    };
    $("composer").onsubmit = (e) => {
        e.preventDefault();
        const value = $("input").value;
        if (value.trim() === "" || state.loading) return;
        $("input").value = "";
        $("counter").textContent = `0/${MAX_PROMPT}`;
        send(value);
    };

    render();
})();
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_filled() {
        let html = html_shell("Weather Chat Assistant");
        assert!(!html.contains("__"));
        assert!(html.contains("<title>Weather Chat Assistant</title>"));
        assert!(html.contains("const MAX_PROMPT = 500;"));
        assert!(html.contains("const TIMEOUT_MS = 30000;"));
    }
}
